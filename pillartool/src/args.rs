//! Key/value view of command-line input.
//!
//! Arguments arrive as `component.key=value` pairs (`--set network.ip=10.0.0.1`)
//! and are handed to each component through a [`Scope`] that strips the
//! component prefix.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use thiserror::Error;

/// Argument bag errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    #[error("invalid argument `{0}`, expected KEY=VALUE")]
    InvalidPair(String),
    #[error("missing required argument `{0}`")]
    Missing(String),
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Parse {
        key: String,
        value: String,
        reason: String,
    },
}

/// Ordered key/value arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgBag {
    values: BTreeMap<String, String>,
}

impl ArgBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from `KEY=VALUE` strings. Later pairs win.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, ArgError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bag = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| ArgError::InvalidPair(pair.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ArgError::InvalidPair(pair.to_string()));
            }
            bag.insert(key, value.trim());
        }
        Ok(bag)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// View of the arguments under `component.`.
    pub fn scope<'a>(&'a self, component: &str) -> Scope<'a> {
        Scope {
            bag: self,
            prefix: format!("{component}."),
        }
    }
}

/// Arguments of one component, keys relative to the component name.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    bag: &'a ArgBag,
    prefix: String,
}

impl<'a> Scope<'a> {
    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    /// Raw value; empty strings count as absent.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.bag
            .values
            .get(&self.full_key(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&'a str, ArgError> {
        self.get(key).ok_or_else(|| ArgError::Missing(self.full_key(key)))
    }

    /// Parse a value with `FromStr`. Absent keys yield `Ok(None)`.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, ArgError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        raw.parse::<T>().map(Some).map_err(|e| ArgError::Parse {
            key: self.full_key(key),
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn parse_required<T>(&self, key: &str) -> Result<T, ArgError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.parse(key)?
            .ok_or_else(|| ArgError::Missing(self.full_key(key)))
    }

    /// Comma separated list, blanks dropped.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Entries under `key.`, as `(rest, value)` pairs.
    pub fn prefixed(&self, key: &str) -> Vec<(&'a str, &'a str)> {
        let prefix = self.full_key(&format!("{key}."));
        self.bag
            .values
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, v)| {
                let rest = &k[prefix.len()..];
                (!rest.is_empty()).then_some((rest, v.as_str()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs() {
        let bag = ArgBag::from_pairs(["network.ip=10.0.0.1", "network.port = 80", "a=b=c"]).unwrap();
        assert_eq!(bag.get("network.ip"), Some("10.0.0.1"));
        assert_eq!(bag.get("network.port"), Some("80"));
        assert_eq!(bag.get("a"), Some("b=c"));

        assert_eq!(
            ArgBag::from_pairs(["novalue"]),
            Err(ArgError::InvalidPair("novalue".to_string()))
        );
        assert!(ArgBag::from_pairs(["=x"]).is_err());
    }

    #[test]
    fn test_scope_get_and_parse() {
        let bag = ArgBag::from_pairs(["network.port=80", "network.ip=", "system.port=1"]).unwrap();
        let scope = bag.scope("network");
        assert_eq!(scope.parse::<u16>("port"), Ok(Some(80)));
        assert_eq!(scope.get("ip"), None);
        assert_eq!(
            scope.require("ip"),
            Err(ArgError::Missing("network.ip".to_string()))
        );
        assert!(matches!(
            bag.scope("system").parse::<bool>("port"),
            Err(ArgError::Parse { .. })
        ));
    }

    #[test]
    fn test_list() {
        let bag = ArgBag::from_pairs(["system.ntp.servers=a, b,,c"]).unwrap();
        assert_eq!(bag.scope("system").list("ntp.servers"), vec!["a", "b", "c"]);
        assert!(bag.scope("system").list("missing").is_empty());
    }

    #[test]
    fn test_prefixed() {
        let bag = ArgBag::from_pairs([
            "release.repo.epel=http://epel",
            "release.repo.base=http://base",
            "release.repos=ignored",
            "release.target_build=x",
        ])
        .unwrap();
        assert_eq!(
            bag.scope("release").prefixed("repo"),
            vec![("base", "http://base"), ("epel", "http://epel")]
        );
    }
}
