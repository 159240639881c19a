use std::{
    fmt,
    path::{Path, PathBuf},
};

use pillarcfg::{PillarStore, SchemaNode, ValidationReport, Value};

use crate::{args::ArgError, ctx::AppContext, lifecycle::ComponentError};

/// Component stages. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    InputsLoaded,
    Validated,
    Saved,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Created => "created",
            Stage::InputsLoaded => "inputs-loaded",
            Stage::Validated => "validated",
            Stage::Saved => "saved",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Stage bookkeeping embedded in every component.
///
/// Holds the output path fixed at construction, the candidate record and
/// the last validation report.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    name: &'static str,
    output: PathBuf,
    store: PillarStore,
    stage: Stage,
    candidate: Option<Value>,
    report: Option<ValidationReport>,
}

impl Lifecycle {
    pub fn new(name: &'static str, ctx: &AppContext) -> Self {
        Self {
            name,
            output: ctx.paths.pillar_path(name),
            store: ctx.store(),
            stage: Stage::Created,
            candidate: None,
            report: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Output file owned by the component.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Report of the validation stage, once it ran.
    pub fn report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    fn require_stage(&mut self, expected: Stage) -> Result<(), ComponentError> {
        if self.stage == expected {
            return Ok(());
        }
        let err = ComponentError::InvalidStage {
            component: self.name,
            stage: self.stage,
            expected,
        };
        self.stage = Stage::Failed;
        Err(err)
    }

    /// Record the outcome of building the candidate from inputs.
    pub fn load_inputs(&mut self, built: Result<Value, ArgError>) -> bool {
        if let Err(e) = self.require_stage(Stage::Created) {
            error!("{e}");
            return false;
        }
        match built {
            Ok(record) => {
                debug!("{}: candidate {record}", self.name);
                self.candidate = Some(record);
                self.stage = Stage::InputsLoaded;
                true
            }
            Err(e) => {
                warn!("{}: insufficient inputs: {e}", self.name);
                self.stage = Stage::Failed;
                false
            }
        }
    }

    /// Validate the candidate against the `name` subtree of `schema`.
    pub fn validate(&mut self, schema: &SchemaNode) -> Result<bool, ComponentError> {
        self.require_stage(Stage::InputsLoaded)?;

        let subtree = match schema.subtree(self.name) {
            Ok(s) => s,
            Err(e) => {
                self.stage = Stage::Failed;
                return Err(e.into());
            }
        };
        let report = subtree.validate_record(self.candidate.as_ref().unwrap_or(&Value::Null));
        for err in &report {
            warn!("{}: {err}", self.name);
        }
        let ok = report.is_ok();
        self.report = Some(report);
        self.stage = if ok { Stage::Validated } else { Stage::Failed };
        if ok {
            info!("{}: candidate is valid", self.name);
        }
        Ok(ok)
    }

    /// Write the validated candidate to the output file.
    pub fn save(&mut self) -> Result<(), ComponentError> {
        self.require_stage(Stage::Validated)?;

        let saved = self
            .store
            .save(&self.output, self.candidate.as_ref().unwrap_or(&Value::Null));
        if let Err(e) = saved {
            self.stage = Stage::Failed;
            return Err(e.into());
        }
        info!("{}: saved {}", self.name, self.output.display());
        self.stage = Stage::Saved;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::PathConfig;
    use serde_json::json;

    fn ctx(dir: &Path) -> AppContext {
        AppContext::new(PathConfig {
            schema: dir.join("schema.yaml"),
            pillar_dir: dir.to_path_buf(),
        })
    }

    fn schema() -> SchemaNode {
        SchemaNode::from_value(&json!({"net": {"ip": "str", "port": "int"}})).unwrap()
    }

    #[test]
    fn test_forward_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let mut lc = Lifecycle::new("net", &ctx(dir.path()));
        assert_eq!(lc.stage(), Stage::Created);

        assert!(lc.load_inputs(Ok(json!({"net": {"ip": "10.0.0.1", "port": 80}}))));
        assert_eq!(lc.stage(), Stage::InputsLoaded);
        assert!(lc.validate(&schema()).unwrap());
        assert_eq!(lc.stage(), Stage::Validated);
        lc.save().unwrap();
        assert_eq!(lc.stage(), Stage::Saved);

        assert_eq!(
            pillarcfg::PillarStore::load(dir.path().join("net.sls")).unwrap(),
            json!({"net": {"ip": "10.0.0.1", "port": 80}})
        );
    }

    #[test]
    fn test_save_without_validation_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut lc = Lifecycle::new("net", &ctx(dir.path()));
        assert!(lc.load_inputs(Ok(json!({"net": {}}))));

        let err = lc.save().unwrap_err();
        assert!(matches!(
            err,
            ComponentError::InvalidStage {
                stage: Stage::InputsLoaded,
                expected: Stage::Validated,
                ..
            }
        ));
        assert_eq!(lc.stage(), Stage::Failed);
        assert!(!dir.path().join("net.sls").exists());
    }

    #[test]
    fn test_invalid_candidate_fails_and_keeps_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut lc = Lifecycle::new("net", &ctx(dir.path()));
        lc.load_inputs(Ok(json!({"net": {"ip": "10.0.0.1", "port": "80"}})));

        assert!(!lc.validate(&schema()).unwrap());
        assert_eq!(lc.stage(), Stage::Failed);
        let report = lc.report().unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].path.to_string(), "net.port");

        // No resuming after a failure.
        assert!(lc.save().is_err());
        assert!(!lc.load_inputs(Ok(json!({}))));
    }

    #[test]
    fn test_insufficient_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut lc = Lifecycle::new("net", &ctx(dir.path()));
        assert!(!lc.load_inputs(Err(ArgError::Missing("net.ip".to_string()))));
        assert_eq!(lc.stage(), Stage::Failed);
        assert!(lc.validate(&schema()).is_err());
    }

    #[test]
    fn test_missing_subtree_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut lc = Lifecycle::new("storage", &ctx(dir.path()));
        lc.load_inputs(Ok(json!({"storage": {}})));
        assert!(matches!(
            lc.validate(&schema()),
            Err(ComponentError::Schema(_))
        ));
        assert_eq!(lc.stage(), Stage::Failed);
    }
}
