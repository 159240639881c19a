//! Configuration component contract.
//!
//! Every configuration domain supplies a [`ConfigComponent`]: it turns the
//! argument bag into a candidate pillar, validates it against its schema
//! subtree and saves it to the one file it owns. The stage bookkeeping
//! shared by all components lives in [`Lifecycle`].
//!
//! - [`stage`] - Stage state machine and shared glue
//! - [`driver`] - Running one or many components to completion

/// Running components through all stages.
pub mod driver;

/// Stage state machine shared by every component.
pub mod stage;

use std::path::PathBuf;

use pillarcfg::{PersistError, SchemaNode, SchemaShapeError};
use thiserror::Error;

use crate::args::ArgBag;

pub use driver::{Outcome, Report, check_component, check_disjoint, run_component, run_components};
pub use stage::{Lifecycle, Stage};

/// Unrecoverable component failures. Validation defects are not errors.
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error(transparent)]
    Schema(#[from] SchemaShapeError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("component `{component}` is {stage}, expected {expected}")]
    InvalidStage {
        component: &'static str,
        stage: Stage,
        expected: Stage,
    },
    #[error("components `{first}` and `{second}` both write {}", path.display())]
    PathConflict {
        first: &'static str,
        second: &'static str,
        path: PathBuf,
    },
    #[error("component task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// One configuration domain: inputs, validation, persistence.
///
/// Stages must be called in order, once each. A component that fails any
/// stage is finished and must be rebuilt for a new attempt.
pub trait ConfigComponent {
    /// Component name; also its schema subtree key and output file stem.
    fn name(&self) -> &'static str;

    /// Shared stage state.
    fn lifecycle(&self) -> &Lifecycle;

    /// Build the candidate pillar from CLI input.
    ///
    /// Returns `false` when the inputs are insufficient to build a record.
    fn process_inputs(&mut self, args: &ArgBag) -> bool;

    /// Validate the candidate against this component's subtree of `schema`.
    ///
    /// Every defect is logged and kept in [`Lifecycle::report`]; returns
    /// `false` if there was any.
    ///
    /// # Errors
    ///
    /// Fails when the schema has no usable subtree for this component or the
    /// stage is out of order.
    fn validate(&mut self, schema: &SchemaNode) -> Result<bool, ComponentError>;

    /// Persist the validated candidate to the component's output file.
    ///
    /// # Errors
    ///
    /// Refused unless validation succeeded; I/O failures surface as
    /// [`ComponentError::Persist`].
    fn save(&mut self) -> Result<(), ComponentError>;
}
