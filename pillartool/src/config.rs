//! Tool configuration file.
//!
//! Optional `.pillartool.toml` in the working directory:
//!
//! ```toml
//! schema = "schema/pillar.yaml"
//! pillar_dir = "${env:PILLAR_ROOT}/components"
//! backup = false
//! ```
//!
//! String values may reference environment variables as `${env:NAME}`.
//! Command-line flags take precedence over file values.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::ctx::{AppContext, PathConfig};

/// Default tool configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".pillartool.toml";

/// Contents of the tool configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Reference schema file.
    pub schema: Option<String>,
    /// Pillar output directory.
    pub pillar_dir: Option<String>,
    /// Back up pillar files before replacing them.
    pub backup: Option<bool>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub schema: Option<PathBuf>,
    pub pillar_dir: Option<PathBuf>,
}

impl ToolConfig {
    /// Read the configuration file; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !path.exists() {
            if explicit {
                anyhow::bail!("Config file does not exist: {}", path.display());
            }
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!("loaded tool config from {}", path.display());
        Ok(config)
    }

    /// Merge with command-line overrides into a context.
    pub fn resolve(self, overrides: Overrides) -> AppContext {
        let defaults = PathConfig::default();
        let from_file = |v: Option<String>| v.map(|s| PathBuf::from(replace_env_placeholders(&s)));

        let paths = PathConfig {
            schema: overrides
                .schema
                .or_else(|| from_file(self.schema))
                .unwrap_or(defaults.schema),
            pillar_dir: overrides
                .pillar_dir
                .or_else(|| from_file(self.pillar_dir))
                .unwrap_or(defaults.pillar_dir),
        };

        AppContext {
            paths,
            backup: self.backup.unwrap_or(false),
        }
    }
}

/// Replace `${env:NAME}` placeholders with environment values.
///
/// Unset variables expand to an empty string. Anything else, including
/// unterminated placeholders, is kept verbatim.
pub fn replace_env_placeholders(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if after[..end].starts_with("env:") => {
                let name = &after[4..end];
                result.push_str(&env::var(name).unwrap_or_default());
                rest = &after[end + 1..];
            }
            Some(end) => {
                result.push_str(&rest[start..start + 2 + end + 1]);
                rest = &after[end + 1..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}
