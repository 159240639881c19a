//! Error types shared by the validator and the store.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Dotted key path into a schema or record, e.g. `network.port`.
///
/// The empty path addresses the record root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Return a new path with `key` appended.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path segments from the root.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for KeyPath {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            return Self::root();
        }
        Self(value.split('.').map(str::to_string).collect())
    }
}

/// The schema itself is malformed. Fatal for the run.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed schema at `{path}`: {reason}")]
pub struct SchemaShapeError {
    /// Where in the schema the problem was found.
    pub path: KeyPath,
    /// What is wrong with it.
    pub reason: String,
}

impl SchemaShapeError {
    pub(crate) fn new(path: KeyPath, reason: impl Into<String>) -> Self {
        Self {
            path,
            reason: reason.into(),
        }
    }
}

/// Kind of a single validation defect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A key named by the schema is absent from the record.
    MissingKey,
    /// The record value has the wrong runtime type.
    TypeMismatch {
        /// Type the schema asks for.
        expected: String,
        /// Type found in the record.
        actual: String,
    },
    /// The record carries a key the schema does not know.
    UnknownKey,
}

/// One defect found while validating a pillar record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Full dotted path of the offending key.
    pub path: KeyPath,
    /// What went wrong.
    pub kind: ValidationErrorKind,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValidationErrorKind::MissingKey => write!(f, "missing key `{}`", self.path),
            ValidationErrorKind::TypeMismatch { expected, actual } => write!(
                f,
                "type mismatch at `{}`: expected {expected}, found {actual}",
                self.path
            ),
            ValidationErrorKind::UnknownKey => write!(f, "unknown key `{}`", self.path),
        }
    }
}

impl std::error::Error for ValidationError {}

/// I/O or serialization failure while saving or loading a pillar file.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize pillar for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse pillar file {}: {source}", path.display())]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path of the file the failed operation targeted.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Serialize { path, .. } | Self::Deserialize { path, .. } => {
                path
            }
        }
    }
}
