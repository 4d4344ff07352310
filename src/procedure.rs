//! Straight-line procedure orchestration with snapshot rollback.
//!
//! Every top-level operation has the same shape: snapshot the protected
//! paths, run the named steps in order, and on the first step failure restore
//! the snapshot that was just taken. There are exactly two states
//! (in progress, terminal) and one conditional edge (failure -> restore).
//! A failed restore is logged and surfaced but never retried; at that point
//! the operator has to intervene by hand.

use crate::error::Result;
use crate::snapshot::SnapshotStore;
use log::{error, info};
use std::path::PathBuf;

/// One named step of a procedure
pub struct Step<'a> {
    pub name: &'static str,
    pub action: Box<dyn FnOnce() -> Result<()> + 'a>,
}

impl<'a> Step<'a> {
    pub fn new(name: &'static str, action: impl FnOnce() -> Result<()> + 'a) -> Self {
        Self {
            name,
            action: Box::new(action),
        }
    }
}

/// Outcome of a completed procedure
#[derive(Debug)]
pub struct ProcedureReport {
    pub name: &'static str,
    pub steps_completed: usize,
    pub snapshot_id: Option<String>,
}

/// Run `steps` in order under the protection of a fresh snapshot of
/// `protected_paths`.
///
/// With an empty `protected_paths` no snapshot is taken and a failure simply
/// propagates (there is nothing to roll back). Otherwise the first failing
/// step triggers a restore of the snapshot created at entry; the step's own
/// error is returned either way.
pub fn run_procedure<'a>(
    name: &'static str,
    store: &SnapshotStore,
    protected_paths: &[PathBuf],
    steps: Vec<Step<'a>>,
) -> Result<ProcedureReport> {
    info!("Procedure {} starting ({} steps)", name, steps.len());

    let snapshot = if protected_paths.is_empty() {
        None
    } else {
        let snapshot = store.create(protected_paths)?;
        store.rotate()?;
        Some(snapshot)
    };
    let snapshot_id = snapshot.as_ref().map(|s| s.id.clone());

    let total = steps.len();
    let mut completed = 0;
    for step in steps {
        info!("Procedure {}: step {}/{} ({})", name, completed + 1, total, step.name);
        match (step.action)() {
            Ok(()) => completed += 1,
            Err(step_err) => {
                error!(
                    "Procedure {} failed at step {} ({}): {}",
                    name,
                    completed + 1,
                    step.name,
                    step_err
                );
                if let Some(snapshot) = &snapshot {
                    match store.restore(snapshot) {
                        Ok(()) => {
                            info!("Procedure {}: restored snapshot {}", name, snapshot.id)
                        }
                        Err(restore_err) => {
                            // Not retried: manual intervention required
                            error!(
                                "Procedure {}: restore of snapshot {} ALSO failed: {}",
                                name, snapshot.id, restore_err
                            );
                        }
                    }
                }
                return Err(step_err);
            }
        }
    }

    info!("Procedure {} completed ({} steps)", name, completed);
    Ok(ProcedureReport {
        name,
        steps_completed: completed,
        snapshot_id,
    })
}
