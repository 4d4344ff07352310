//! Pre-flight sanity checks for the runtime environment
//!
//! Verifies the host before any mutating procedure starts:
//! - Required runtime binaries are present
//! - Running with root privileges (EUID 0)
//! - The distribution ID and release match the configured target
//!
//! If any check fails, the caller gets a `Precondition` error before any
//! package-manager state has been touched.

use crate::config::Config;
use crate::error::{Result, StewardError};
use crate::system::binary_exists;
use std::fs;

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
    pub distro_ok: bool,
    pub detected_distro: String,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root && self.distro_ok
    }
}

/// Required runtime binaries for steward procedures
const REQUIRED_BINARIES: &[&str] = &[
    "apt-get",   // Package install/remove
    "dpkg-query", // Installed-state queries
    "gpg",       // Key dearmoring and keyserver fetch
    "systemctl", // Display manager service management
];

/// Optional binaries (warn if missing but don't fail; the acquisition
/// chain falls back across them)
const OPTIONAL_BINARIES: &[&str] = &["curl", "wget", "fallocate"];

/// Check if running as root (EUID 0)
fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Parse a field like `ID=debian` or `VERSION_ID="12"` out of os-release
fn os_release_field(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.strip_prefix(key)?.strip_prefix('=')?;
        Some(rest.trim().trim_matches('"').to_string())
    })
}

/// Check the distribution ID and VERSION_ID against the configured target
pub fn check_distro(config: &Config) -> Result<(String, String)> {
    let content = fs::read_to_string(&config.os_release_path).map_err(|e| {
        StewardError::precondition(format!(
            "Cannot read {}: {}",
            config.os_release_path.display(),
            e
        ))
    })?;

    let id = os_release_field(&content, "ID").unwrap_or_default();
    let version = os_release_field(&content, "VERSION_ID").unwrap_or_default();

    if id != config.distro_id || version != config.distro_release {
        return Err(StewardError::precondition(format!(
            "This tool targets {} {} but found {} {}",
            config.distro_id,
            config.distro_release,
            if id.is_empty() { "<unknown>" } else { &id },
            if version.is_empty() { "<unknown>" } else { &version },
        )));
    }

    Ok((id, version))
}

/// Perform all sanity checks and return the result
pub fn verify_environment(config: &Config) -> SanityCheckResult {
    let mut missing = Vec::new();

    for binary in REQUIRED_BINARIES {
        if !binary_exists(binary) {
            missing.push((*binary).to_string());
        }
    }

    for binary in OPTIONAL_BINARIES {
        if !binary_exists(binary) {
            log::debug!("Optional binary not found: {}", binary);
        }
    }

    let (distro_ok, detected) = match check_distro(config) {
        Ok((id, version)) => (true, format!("{} {}", id, version)),
        Err(e) => {
            log::warn!("{}", e);
            (false, "unknown".to_string())
        }
    };

    SanityCheckResult {
        missing_binaries: missing,
        is_root: is_running_as_root(),
        distro_ok,
        detected_distro: detected,
    }
}

/// Skip root check (for development/testing)
/// Set DEBSTEWARD_SKIP_ROOT_CHECK=1 to skip
pub fn should_skip_root_check() -> bool {
    std::env::var("DEBSTEWARD_SKIP_ROOT_CHECK")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Run pre-flight checks, returning a `Precondition` error on failure
pub fn run_preflight_checks(config: &Config) -> Result<()> {
    log::debug!("Running pre-flight sanity checks...");

    let mut result = verify_environment(config);

    if should_skip_root_check() {
        log::warn!("Root check skipped (DEBSTEWARD_SKIP_ROOT_CHECK=1)");
        result.is_root = true;
    }

    if result.is_ok() {
        log::info!(
            "Pre-flight checks passed: root={}, distro={}",
            result.is_root,
            result.detected_distro
        );
        return Ok(());
    }

    let mut problems = Vec::new();
    if !result.is_root {
        problems.push("root privileges required (run with sudo)".to_string());
    }
    if !result.distro_ok {
        problems.push(format!(
            "unsupported distribution ({}, expected {} {})",
            result.detected_distro, config.distro_id, config.distro_release
        ));
    }
    if !result.missing_binaries.is_empty() {
        problems.push(describe_missing_binaries(&result.missing_binaries));
    }

    Err(StewardError::precondition(problems.join("; ")))
}

/// Missing-binary problem line with the Debian package providing each one
fn describe_missing_binaries(missing: &[String]) -> String {
    let hints: Vec<String> = missing
        .iter()
        .map(|b| format!("{} (package {})", b, get_package_for_binary(b)))
        .collect();
    format!("missing required binaries: {}", hints.join(", "))
}

/// Map binary names to their Debian package names (for error hints)
fn get_package_for_binary(binary: &str) -> &'static str {
    match binary {
        "apt-get" | "dpkg-query" => "apt",
        "gpg" => "gnupg",
        "systemctl" => "systemd",
        "curl" => "curl",
        "wget" => "wget",
        "fallocate" => "util-linux",
        _ => "unknown",
    }
}
