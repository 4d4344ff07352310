//! Third-party repository cleanup.
//!
//! Removes every list file under the apt sources directory and every managed
//! keyring, then refreshes the package lists. Both directories are
//! snapshotted first, so a failed `apt-get update` rolls the removals back.

use crate::apt;
use crate::config::Config;
use crate::error::Result;
use crate::procedure::{run_procedure, ProcedureReport, Step};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Remove all third-party sources and keyrings, then `apt-get update`
pub fn clean(config: &Config) -> Result<ProcedureReport> {
    let store = super::open_store(config)?;
    let protected: Vec<PathBuf> =
        vec![config.apt_sources_dir.clone(), config.keyring_dir.clone()];

    let steps = vec![
        Step::new("remove-third-party-lists", || {
            if config.dry_run {
                info!(
                    "[dry-run] skipped: clearing {}",
                    config.apt_sources_dir.display()
                );
                return Ok(());
            }
            let removed =
                remove_matching(&config.apt_sources_dir, &["list", "sources"])?;
            info!("Removed {} third-party source files", removed);
            Ok(())
        }),
        Step::new("remove-managed-keyrings", || {
            if config.dry_run {
                info!("[dry-run] skipped: clearing {}", config.keyring_dir.display());
                return Ok(());
            }
            let removed = remove_matching(&config.keyring_dir, &["gpg", "asc"])?;
            info!("Removed {} keyring files", removed);
            Ok(())
        }),
        Step::new("apt-update", || apt::update(config)),
    ];

    run_procedure("repo-clean", &store, &protected, steps)
}

/// Delete regular files in `dir` whose extension matches; returns the count
fn remove_matching(dir: &Path, extensions: &[&str]) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e))
            .unwrap_or(false);
        if matches {
            fs::remove_file(&path)?;
            info!("Removed {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}
