//! Schema model and record validation.
//!
//! A schema is a dict-of-dicts tree whose leaves are type tags:
//!
//! ```yaml
//! network:
//!   ip: str
//!   port: int
//!   gateway: str?
//!   labels:
//!     "*": str
//! ```
//!
//! - [`node`] - Parsed schema tree and type tags
//! - [`validate`] - Closed-world record validation

/// Parsed schema tree and type tags.
pub mod node;

/// Record validation against a parsed schema.
pub mod validate;

pub use node::{MapNode, SchemaNode, TypeKind, TypeTag, WILDCARD_KEY};
pub use validate::{ValidationReport, validate};
