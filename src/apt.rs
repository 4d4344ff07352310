//! Thin wrappers around apt-get and dpkg-query.
//!
//! Exit status is the only contract observed; stdout is parsed only for
//! `dpkg-query` installed-state answers. All mutating calls run
//! non-interactively and honor dry-run by logging the skipped command.

use crate::config::Config;
use crate::error::Result;
use crate::system;
use log::info;

const APT_ENV: &[(&str, &str)] = &[("DEBIAN_FRONTEND", "noninteractive")];

/// Refresh package lists (`apt-get update`)
pub fn update(config: &Config) -> Result<()> {
    if config.dry_run {
        info!("[dry-run] skipped: apt-get update");
        return Ok(());
    }
    let output = system::run_with_env("apt-get", &["update"], APT_ENV)?;
    output.ensure_success("apt-get update")
}

/// Install packages (`apt-get install -y`)
pub fn install(config: &Config, packages: &[&str]) -> Result<()> {
    if packages.is_empty() {
        return Ok(());
    }
    if config.dry_run {
        info!("[dry-run] skipped: apt-get install -y {}", packages.join(" "));
        return Ok(());
    }
    let mut args = vec!["install", "-y"];
    args.extend_from_slice(packages);
    let output = system::run_with_env("apt-get", &args, APT_ENV)?;
    output.ensure_success("apt-get install")
}

/// Purge packages with their configuration (`apt-get purge -y`)
pub fn purge(config: &Config, packages: &[&str]) -> Result<()> {
    if packages.is_empty() {
        return Ok(());
    }
    if config.dry_run {
        info!("[dry-run] skipped: apt-get purge -y {}", packages.join(" "));
        return Ok(());
    }
    let mut args = vec!["purge", "-y"];
    args.extend_from_slice(packages);
    let output = system::run_with_env("apt-get", &args, APT_ENV)?;
    output.ensure_success("apt-get purge")?;

    let autoremove = system::run_with_env("apt-get", &["autoremove", "-y"], APT_ENV)?;
    autoremove.ensure_success("apt-get autoremove")
}

/// Check whether a package is in the "install ok installed" state
pub fn is_installed(package: &str) -> Result<bool> {
    let output = system::run(
        "dpkg-query",
        &["-W", "-f", "${Status}", package],
    )?;
    // dpkg-query exits non-zero for unknown packages; that just means "no"
    Ok(output.success && output.stdout.contains("install ok installed"))
}

/// Check that every named package is installed; returns the missing ones
pub fn missing_packages(packages: &[&str]) -> Result<Vec<String>> {
    let mut missing = Vec::new();
    for package in packages {
        if !is_installed(package)? {
            missing.push((*package).to_string());
        }
    }
    Ok(missing)
}
