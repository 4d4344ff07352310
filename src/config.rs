//! Steward configuration: every procedure receives this struct explicitly.
//!
//! There is no ambient state (environment sniffing, current-directory
//! assumptions) inside the library; the binary builds one `Config` up front
//! and threads it through. Values can be overridden from a JSON file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Runtime configuration for all steward procedures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory holding timestamped snapshot subdirectories
    pub backup_root: PathBuf,
    /// Maximum snapshots retained after rotation
    pub max_snapshots: usize,

    /// Expected os-release ID (e.g. "debian")
    pub distro_id: String,
    /// Expected os-release VERSION_ID (e.g. "12")
    pub distro_release: String,
    /// Path to os-release (overridable for tests)
    pub os_release_path: PathBuf,

    /// Third-party apt sources directory
    pub apt_sources_dir: PathBuf,
    /// Directory for dearmored signing keys
    pub keyring_dir: PathBuf,
    /// Path to fstab for swap entries
    pub fstab_path: PathBuf,
    /// Swapfile location
    pub swapfile_path: PathBuf,

    /// Editor vendor repository signing key URL
    pub editor_key_url: String,
    /// Editor vendor apt repository line (without the signed-by option)
    pub editor_repo: String,
    /// Editor package name
    pub editor_package: String,
    /// Database client packages installed by `install db-tools`
    pub db_tool_packages: Vec<String>,
    /// GPG keyserver used as the last acquisition fallback
    pub keyserver: String,
    /// Editor signing key fingerprint for the keyserver fallback
    pub editor_key_fingerprint: String,

    /// Skip destructive commands, logging what would run instead
    #[serde(skip)]
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_root: PathBuf::from("/var/backups/debsteward"),
            max_snapshots: 3,
            distro_id: "debian".to_string(),
            distro_release: "12".to_string(),
            os_release_path: PathBuf::from("/etc/os-release"),
            apt_sources_dir: PathBuf::from("/etc/apt/sources.list.d"),
            keyring_dir: PathBuf::from("/etc/apt/keyrings"),
            fstab_path: PathBuf::from("/etc/fstab"),
            swapfile_path: PathBuf::from("/swapfile"),
            editor_key_url: "https://packages.microsoft.com/keys/microsoft.asc".to_string(),
            editor_repo: "https://packages.microsoft.com/repos/code stable main".to_string(),
            editor_package: "code".to_string(),
            db_tool_packages: vec![
                "postgresql-client".to_string(),
                "default-mysql-client".to_string(),
                "sqlite3".to_string(),
            ],
            keyserver: "hkps://keyserver.ubuntu.com".to_string(),
            editor_key_fingerprint: "BC528686B50D79E339D3721CEB3E94ADBE1229CF".to_string(),
            dry_run: false,
        }
    }
}

impl Config {
    /// Load configuration overrides from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_snapshots == 0 {
            anyhow::bail!("max_snapshots must be at least 1");
        }
        if self.distro_id.trim().is_empty() {
            anyhow::bail!("distro_id must be specified");
        }
        if self.distro_release.trim().is_empty() {
            anyhow::bail!("distro_release must be specified");
        }
        if !self.backup_root.is_absolute() {
            anyhow::bail!(
                "backup_root must be an absolute path, got {:?}",
                self.backup_root
            );
        }
        if !self.swapfile_path.is_absolute() {
            anyhow::bail!(
                "swapfile_path must be an absolute path, got {:?}",
                self.swapfile_path
            );
        }
        if self.editor_package.trim().is_empty() {
            anyhow::bail!("editor_package must be specified");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_snapshots, 3);
        assert_eq!(config.distro_id, "debian");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.max_snapshots = 5;
        config.distro_release = "13".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.max_snapshots, 5);
        assert_eq!(loaded.distro_release, "13");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Config::load_from_file(Path::new("/nonexistent/steward.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(b"{ not json").unwrap();
        assert!(Config::load_from_file(temp.path()).is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(br#"{"max_snapshots": 7}"#).unwrap();
        let config = Config::load_from_file(temp.path()).unwrap();
        assert_eq!(config.max_snapshots, 7);
        assert_eq!(config.distro_id, "debian");
    }

    #[test]
    fn test_validate_rejects_zero_retention() {
        let mut config = Config::default();
        config.max_snapshots = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_backup_root() {
        let mut config = Config::default();
        config.backup_root = PathBuf::from("backups");
        assert!(config.validate().is_err());
    }
}
