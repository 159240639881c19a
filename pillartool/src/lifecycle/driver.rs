use std::{collections::HashMap, path::PathBuf, sync::Arc};

use pillarcfg::{SchemaNode, ValidationReport};

use crate::{
    args::ArgBag,
    components::{AnyComponent, ComponentKind},
    ctx::AppContext,
    lifecycle::{ComponentError, ConfigComponent},
};

/// Reported result of driving one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Pillar written to this path.
    Saved(PathBuf),
    /// Candidate validated; nothing written (dry run).
    Valid,
    /// Inputs could not produce a candidate.
    InsufficientInputs,
    /// Candidate failed validation.
    Invalid(ValidationReport),
}

impl Outcome {
    /// Whether the run reached its final stage.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Saved(_) | Outcome::Valid)
    }
}

/// Outcome of one component in a batch run.
#[derive(Debug)]
pub struct Report {
    pub kind: ComponentKind,
    pub result: Result<Outcome, ComponentError>,
}

fn inputs_and_validation<C: ConfigComponent>(
    component: &mut C,
    args: &ArgBag,
    schema: &SchemaNode,
) -> Result<Option<Outcome>, ComponentError> {
    info!("{}: processing inputs", component.name());
    if !component.process_inputs(args) {
        return Ok(Some(Outcome::InsufficientInputs));
    }
    if !component.validate(schema)? {
        let report = component.lifecycle().report().cloned().unwrap_or_default();
        return Ok(Some(Outcome::Invalid(report)));
    }
    Ok(None)
}

/// Run inputs, validation and save for one component.
pub fn run_component<C: ConfigComponent>(
    component: &mut C,
    args: &ArgBag,
    schema: &SchemaNode,
) -> Result<Outcome, ComponentError> {
    if let Some(outcome) = inputs_and_validation(component, args, schema)? {
        return Ok(outcome);
    }
    component.save()?;
    Ok(Outcome::Saved(component.lifecycle().output().to_path_buf()))
}

/// Run inputs and validation only.
pub fn check_component<C: ConfigComponent>(
    component: &mut C,
    args: &ArgBag,
    schema: &SchemaNode,
) -> Result<Outcome, ComponentError> {
    Ok(inputs_and_validation(component, args, schema)?.unwrap_or(Outcome::Valid))
}

/// Refuse component sets in which two members write the same file.
pub fn check_disjoint<C: ConfigComponent>(components: &[C]) -> Result<(), ComponentError> {
    let mut owners: HashMap<PathBuf, &'static str> = HashMap::new();
    for c in components {
        let path = c.lifecycle().output().to_path_buf();
        if let Some(first) = owners.insert(path.clone(), c.name()) {
            return Err(ComponentError::PathConflict {
                first,
                second: c.name(),
                path,
            });
        }
    }
    Ok(())
}

/// Drive several components in parallel, one blocking task each.
///
/// Reports come back in the order of `kinds`. With `dry_run` nothing is
/// written.
///
/// # Errors
///
/// Fails before any work if the schema lacks a subtree for one of `kinds`
/// or if two components would write the same file.
pub async fn run_components(
    kinds: &[ComponentKind],
    ctx: &AppContext,
    args: Arc<ArgBag>,
    schema: Arc<SchemaNode>,
    dry_run: bool,
) -> Result<Vec<Report>, ComponentError> {
    for kind in kinds {
        schema.subtree(kind.name())?;
    }
    let components: Vec<AnyComponent> = kinds.iter().map(|k| k.build(ctx)).collect();
    check_disjoint(&components)?;

    let handles: Vec<_> = components
        .into_iter()
        .zip(kinds.iter().copied())
        .map(|(mut component, kind)| {
            let args = args.clone();
            let schema = schema.clone();
            let handle = tokio::task::spawn_blocking(move || {
                if dry_run {
                    check_component(&mut component, &args, &schema)
                } else {
                    run_component(&mut component, &args, &schema)
                }
            });
            (kind, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (kind, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(ComponentError::Join(e)),
        };
        reports.push(Report { kind, result });
    }
    Ok(reports)
}
