//! Desktop-environment switching.
//!
//! Switching installs the target environment and its display manager first,
//! verifies the replacement packages are actually installed, and only then
//! purges the previous environment. The display-manager configuration
//! directories of both environments are snapshotted before anything runs.

use crate::apt;
use crate::config::Config;
use crate::error::{Result, StewardError};
use crate::procedure::{run_procedure, ProcedureReport, Step};
use crate::system;
use crate::types::{DesktopEnvironment, DisplayManager};
use log::{info, warn};
use std::path::PathBuf;
use strum::IntoEnumIterator;

/// Installed-state of every known environment
pub fn status() -> Result<Vec<(DesktopEnvironment, bool)>> {
    let mut report = Vec::new();
    for de in DesktopEnvironment::iter() {
        report.push((de, apt::is_installed(de.marker_package())?));
    }
    Ok(report)
}

/// The first environment whose marker package is installed, excluding `target`
pub fn detect_current(target: DesktopEnvironment) -> Result<Option<DesktopEnvironment>> {
    for de in DesktopEnvironment::iter() {
        if de == target {
            continue;
        }
        if apt::is_installed(de.marker_package())? {
            return Ok(Some(de));
        }
    }
    Ok(None)
}

/// Switch the system to `target`, optionally keeping the old environment
pub fn switch(config: &Config, target: DesktopEnvironment, keep_old: bool) -> Result<ProcedureReport> {
    let store = super::open_store(config)?;
    let target_dm = target.display_manager();

    let current = detect_current(target)?;
    match current {
        Some(de) => info!("Switching desktop environment: {} -> {}", de, target),
        None => info!("No current desktop environment detected; installing {}", target),
    }

    let mut protected: Vec<PathBuf> = target_dm.config_paths();
    if let Some(de) = current {
        for path in de.display_manager().config_paths() {
            if !protected.contains(&path) {
                protected.push(path);
            }
        }
    }

    let mut expected: Vec<&str> = target.packages().to_vec();
    expected.push(target_dm.package());

    let steps = vec![
        Step::new("apt-update", || apt::update(config)),
        Step::new("install-target-desktop", {
            let packages = expected.clone();
            move || apt::install(config, &packages)
        }),
        Step::new("enable-display-manager", move || {
            enable_display_manager(config, target_dm)
        }),
        Step::new("verify-replacement-installed", {
            let packages = expected.clone();
            move || {
                if config.dry_run {
                    return Ok(());
                }
                let missing = apt::missing_packages(&packages)?;
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(StewardError::mutation(format!(
                        "replacement packages not installed: {}",
                        missing.join(", ")
                    )))
                }
            }
        }),
        Step::new("purge-previous-desktop", move || {
            let old = match current {
                Some(de) if !keep_old => de,
                _ => return Ok(()),
            };
            let mut doomed: Vec<&str> = old.packages().to_vec();
            let old_dm = old.display_manager();
            if old_dm != target_dm {
                doomed.push(old_dm.package());
            }
            apt::purge(config, &doomed)
        }),
    ];

    run_procedure("desktop-switch", &store, &protected, steps)
}

fn enable_display_manager(config: &Config, dm: DisplayManager) -> Result<()> {
    if config.dry_run {
        info!("[dry-run] skipped: systemctl enable {}", dm.service());
        return Ok(());
    }
    let enable = system::run("systemctl", &["enable", dm.service()])?;
    enable.ensure_success("systemctl enable")?;

    // set-default failure is warned, not fatal: the display manager is
    // already enabled at this point
    let target = system::run("systemctl", &["set-default", "graphical.target"])?;
    if !target.success {
        warn!(
            "systemctl set-default graphical.target failed: {}",
            target.stderr.trim()
        );
    }
    Ok(())
}
