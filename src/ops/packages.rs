//! Editor and database-tool installation.
//!
//! The editor comes from a vendor repository: its signing key is obtained
//! through the ordered fallback chain, the signed-by sources entry is written,
//! and only then does apt install run. The apt configuration directories are
//! snapshotted first so a failed install rolls the sources state back.
//! Database tools are plain distro packages and need no repository mutation.

use crate::acquire::acquire;
use crate::apt;
use crate::config::Config;
use crate::error::Result;
use crate::keyring::KeySpec;
use crate::procedure::{run_procedure, ProcedureReport, Step};
use log::info;
use std::fs;
use std::path::PathBuf;

/// Signing-key spec for the configured editor repository
pub fn editor_key_spec(config: &Config) -> KeySpec {
    KeySpec {
        identifier: format!("{}-signing-key", config.editor_package),
        url: config.editor_key_url.clone(),
        fingerprint: config.editor_key_fingerprint.clone(),
        keyserver: config.keyserver.clone(),
        dest: config
            .keyring_dir
            .join(format!("{}.gpg", config.editor_package)),
    }
}

/// Sources-list line for the editor repository
pub fn editor_sources_line(config: &Config, key_dest: &std::path::Path) -> String {
    format!(
        "deb [arch=amd64 signed-by={}] {}\n",
        key_dest.display(),
        config.editor_repo
    )
}

/// Install the configured editor from its vendor repository
pub fn install_editor(config: &Config) -> Result<ProcedureReport> {
    let store = super::open_store(config)?;
    let spec = editor_key_spec(config);
    let list_path = config
        .apt_sources_dir
        .join(format!("{}.list", config.editor_package));

    let protected: Vec<PathBuf> =
        vec![config.apt_sources_dir.clone(), config.keyring_dir.clone()];

    let steps = vec![
        Step::new("acquire-signing-key", {
            let spec = spec.clone();
            move || {
                if config.dry_run {
                    info!("[dry-run] skipped: key acquisition for {}", spec.identifier);
                    return Ok(());
                }
                acquire(&spec.identifier, spec.strategies())
            }
        }),
        Step::new("write-sources-list", {
            let line = editor_sources_line(config, &spec.dest);
            let list_path = list_path.clone();
            move || {
                if config.dry_run {
                    info!("[dry-run] skipped: write {}", list_path.display());
                    return Ok(());
                }
                if let Some(parent) = list_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&list_path, line)?;
                info!("Wrote {}", list_path.display());
                Ok(())
            }
        }),
        Step::new("apt-update", || apt::update(config)),
        Step::new("install-editor", move || {
            apt::install(config, &[config.editor_package.as_str()])
        }),
    ];

    run_procedure("install-editor", &store, &protected, steps)
}

/// Install the configured database client packages from the distro repos
pub fn install_db_tools(config: &Config) -> Result<ProcedureReport> {
    let store = super::open_store(config)?;
    let packages: Vec<&str> = config.db_tool_packages.iter().map(|s| s.as_str()).collect();

    let steps = vec![
        Step::new("apt-update", || apt::update(config)),
        Step::new("install-db-tools", {
            let packages = packages.clone();
            move || apt::install(config, &packages)
        }),
    ];

    // No apt configuration is mutated here, so there is nothing to snapshot
    run_procedure("install-db-tools", &store, &[], steps)
}
