//! # pillarcfg
//!
//! Schema validation and atomic persistence for pillar configuration records.
//!
//! A pillar is a nested configuration mapping scoped to one domain (network,
//! release, ...) that a configuration-management backend consumes as a YAML
//! `.sls` file. This crate checks such a record against a reference schema
//! and writes it to disk without ever leaving a half-written file behind.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pillarcfg::{PillarStore, schema::validate};
//! use serde_json::json;
//!
//! let schema = json!({"net": {"ip": "str", "port": "int"}});
//! let record = json!({"net": {"ip": "10.0.0.1", "port": 80}});
//!
//! let report = validate(&schema, &record).unwrap();
//! assert!(report.is_ok());
//!
//! PillarStore::new().save("pillar/net.sls", &record).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - Schema parsing and closed-world validation
//! - [`store`] - Atomic YAML persistence
//! - [`error`] - Error types

/// Error types shared by the validator and the store.
pub mod error;

/// Schema parsing and record validation.
pub mod schema;

/// Atomic YAML persistence of validated records.
pub mod store;

#[macro_use]
extern crate log;

pub use error::{KeyPath, PersistError, SchemaShapeError, ValidationError, ValidationErrorKind};
pub use schema::{SchemaNode, ValidationReport};
pub use serde_json::Value;
pub use store::PillarStore;
