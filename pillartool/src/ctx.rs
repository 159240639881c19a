//! Application context.
//!
//! [`AppContext`] carries the resolved locations of the reference schema and
//! the pillar output directory. Components receive it at construction and
//! never look paths up on their own.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use pillarcfg::{PillarStore, SchemaNode, Value};

/// Extension of generated pillar files.
pub const PILLAR_EXT: &str = "sls";

/// Path configuration grouping all location-related fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    /// Reference schema file (YAML or JSON).
    pub schema: PathBuf,
    /// Directory holding one pillar file per component.
    pub pillar_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            schema: PathBuf::from("schema/pillar.yaml"),
            pillar_dir: PathBuf::from("pillar"),
        }
    }
}

impl PathConfig {
    /// Output file owned by `component`.
    pub fn pillar_path(&self, component: &str) -> PathBuf {
        self.pillar_dir.join(format!("{component}.{PILLAR_EXT}"))
    }
}

/// The main application context.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    /// Schema and output locations.
    pub paths: PathConfig,
    /// Keep a timestamped copy of a pillar file before replacing it.
    pub backup: bool,
}

impl AppContext {
    pub fn new(paths: PathConfig) -> Self {
        Self {
            paths,
            backup: false,
        }
    }

    /// Store configured for this run.
    pub fn store(&self) -> PillarStore {
        PillarStore::new().with_backup(self.backup)
    }

    /// Load and parse the reference schema.
    pub fn load_schema(&self) -> anyhow::Result<SchemaNode> {
        load_schema(&self.paths.schema)
    }
}

/// Load a schema file, dispatching on its extension.
pub fn load_schema(path: &Path) -> anyhow::Result<SchemaNode> {
    if !path.exists() {
        bail!("Schema file does not exist: {}", path.display());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;

    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let value: Value = match ext {
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML schema {}", path.display()))?,
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON schema {}", path.display()))?,
        _ => bail!("Unsupported schema file extension: {ext:?}"),
    };
    debug!("loaded schema from {}", path.display());

    Ok(SchemaNode::from_value(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pillar_path() {
        let paths = PathConfig {
            schema: PathBuf::from("s.yaml"),
            pillar_dir: PathBuf::from("/srv/pillar"),
        };
        assert_eq!(
            paths.pillar_path("network"),
            PathBuf::from("/srv/pillar/network.sls")
        );
    }

    #[test]
    fn test_load_schema_formats() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("s.yaml");
        fs::write(&yaml, "net:\n  ip: str\n  port: int\n").unwrap();
        let json = dir.path().join("s.json");
        fs::write(&json, r#"{"net": {"ip": "str", "port": "int"}}"#).unwrap();

        assert_eq!(load_schema(&yaml).unwrap(), load_schema(&json).unwrap());
    }

    #[test]
    fn test_load_schema_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_schema(&dir.path().join("none.yaml")).is_err());

        let toml = dir.path().join("s.toml");
        fs::write(&toml, "a = 1").unwrap();
        assert!(load_schema(&toml).is_err());

        let bad = dir.path().join("bad.yaml");
        fs::write(&bad, "- str\n- int\n").unwrap();
        let err = load_schema(&bad).unwrap_err();
        assert!(err.downcast_ref::<pillarcfg::SchemaShapeError>().is_some());
    }

    #[test]
    fn test_bundled_schema_parses() {
        let schema = load_schema(&Path::new(env!("CARGO_MANIFEST_DIR")).join("schema/pillar.yaml"))
            .unwrap();
        for name in ["network", "release", "system"] {
            assert!(schema.subtree(name).is_ok(), "{name}");
        }
    }
}
