//! Swapfile management.
//!
//! Allocation has its own ordered fallback: `fallocate` is instant but not
//! available on every filesystem, so `dd` from /dev/zero is the second
//! strategy. The fstab entry is the only configuration mutated, and fstab is
//! snapshotted before either create or remove runs.

use crate::acquire::{acquire, FnStrategy, Strategy};
use crate::config::Config;
use crate::error::Result;
use crate::procedure::{run_procedure, ProcedureReport, Step};
use crate::system;
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Create, activate and persist a swapfile of `size_mb` megabytes
pub fn create(config: &Config, size_mb: u64) -> Result<ProcedureReport> {
    let store = super::open_store(config)?;
    let protected = vec![config.fstab_path.clone()];
    let swapfile = config.swapfile_path.clone();

    let steps = vec![
        Step::new("allocate-swapfile", {
            let swapfile = swapfile.clone();
            move || {
                if config.dry_run {
                    info!(
                        "[dry-run] skipped: allocate {} MiB at {}",
                        size_mb,
                        swapfile.display()
                    );
                    return Ok(());
                }
                allocate_swapfile(&swapfile, size_mb)
            }
        }),
        Step::new("format-and-activate", {
            let swapfile = swapfile.clone();
            move || {
                if config.dry_run {
                    info!("[dry-run] skipped: mkswap/swapon {}", swapfile.display());
                    return Ok(());
                }
                let path = swapfile.display().to_string();
                set_swapfile_permissions(&swapfile)?;
                system::run("mkswap", &[&path])?.ensure_success("mkswap")?;
                system::run("swapon", &[&path])?.ensure_success("swapon")
            }
        }),
        Step::new("persist-fstab-entry", {
            let swapfile = swapfile.clone();
            move || {
                if config.dry_run {
                    info!("[dry-run] skipped: fstab entry for {}", swapfile.display());
                    return Ok(());
                }
                add_fstab_entry(&config.fstab_path, &swapfile)
            }
        }),
    ];

    run_procedure("swap-create", &store, &protected, steps)
}

/// Deactivate and remove the managed swapfile and its fstab entry
pub fn remove(config: &Config) -> Result<ProcedureReport> {
    let store = super::open_store(config)?;
    let protected = vec![config.fstab_path.clone()];
    let swapfile = config.swapfile_path.clone();

    let steps = vec![
        Step::new("swapoff", {
            let swapfile = swapfile.clone();
            move || {
                if config.dry_run {
                    info!("[dry-run] skipped: swapoff {}", swapfile.display());
                    return Ok(());
                }
                let path = swapfile.display().to_string();
                let output = system::run("swapoff", &[&path])?;
                if !output.success {
                    // Absorbed: the file may simply not be active
                    warn!("swapoff {} failed: {}", path, output.stderr.trim());
                }
                Ok(())
            }
        }),
        Step::new("drop-fstab-entry", {
            let swapfile = swapfile.clone();
            move || {
                if config.dry_run {
                    info!("[dry-run] skipped: remove fstab entry");
                    return Ok(());
                }
                remove_fstab_entry(&config.fstab_path, &swapfile)
            }
        }),
        Step::new("delete-swapfile", {
            let swapfile = swapfile.clone();
            move || {
                if config.dry_run {
                    info!("[dry-run] skipped: delete {}", swapfile.display());
                    return Ok(());
                }
                if swapfile.exists() {
                    fs::remove_file(&swapfile)?;
                } else {
                    warn!("Swapfile {} already absent", swapfile.display());
                }
                Ok(())
            }
        }),
    ];

    run_procedure("swap-remove", &store, &protected, steps)
}

/// Current swap devices as reported by /proc/swaps
pub fn status() -> Result<String> {
    Ok(fs::read_to_string("/proc/swaps")?)
}

/// Ordered-fallback allocation: fallocate, then dd
fn allocate_swapfile(swapfile: &Path, size_mb: u64) -> Result<()> {
    let path = swapfile.display().to_string();
    let size = format!("{}M", size_mb);
    let of_arg = format!("of={}", path);
    let count = format!("count={}", size_mb);

    let strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(FnStrategy::new("fallocate", {
            let path = path.clone();
            let size = size.clone();
            move || {
                system::run("fallocate", &["-l", &size, &path])?.ensure_success("fallocate")
            }
        })),
        Box::new(FnStrategy::new("dd", move || {
            system::run("dd", &["if=/dev/zero", &of_arg, "bs=1M", &count])?
                .ensure_success("dd")
        })),
    ];

    acquire("swapfile-allocation", strategies)
}

#[cfg(unix)]
fn set_swapfile_permissions(swapfile: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(swapfile, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

/// Append the swap entry to fstab unless it is already present
fn add_fstab_entry(fstab: &Path, swapfile: &Path) -> Result<()> {
    let entry = fstab_line(swapfile);
    let content = if fstab.exists() {
        fs::read_to_string(fstab)?
    } else {
        String::new()
    };

    if content.lines().any(|line| line.trim() == entry) {
        info!("fstab entry already present for {}", swapfile.display());
        return Ok(());
    }

    let mut updated = content;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&entry);
    updated.push('\n');
    fs::write(fstab, updated)?;
    Ok(())
}

/// Remove any fstab line referencing the swapfile
fn remove_fstab_entry(fstab: &Path, swapfile: &Path) -> Result<()> {
    if !fstab.exists() {
        return Ok(());
    }
    let needle = swapfile.display().to_string();
    let content = fs::read_to_string(fstab)?;
    let kept: Vec<&str> = content
        .lines()
        .filter(|line| line.split_whitespace().next() != Some(needle.as_str()))
        .collect();
    let mut updated = kept.join("\n");
    if !updated.is_empty() {
        updated.push('\n');
    }
    fs::write(fstab, updated)?;
    Ok(())
}

fn fstab_line(swapfile: &Path) -> String {
    format!("{} none swap sw 0 0", swapfile.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_add_fstab_entry_appends_once() {
        let dir = tempfile::tempdir().unwrap();
        let fstab = dir.path().join("fstab");
        fs::write(&fstab, "/dev/sda1 / ext4 defaults 0 1\n").unwrap();
        let swapfile = PathBuf::from("/swapfile");

        add_fstab_entry(&fstab, &swapfile).unwrap();
        add_fstab_entry(&fstab, &swapfile).unwrap();

        let content = fs::read_to_string(&fstab).unwrap();
        let swap_lines = content
            .lines()
            .filter(|l| l.contains("/swapfile"))
            .count();
        assert_eq!(swap_lines, 1);
        assert!(content.contains("/dev/sda1"));
    }

    #[test]
    fn test_remove_fstab_entry_keeps_other_lines() {
        let dir = tempfile::tempdir().unwrap();
        let fstab = dir.path().join("fstab");
        fs::write(
            &fstab,
            "/dev/sda1 / ext4 defaults 0 1\n/swapfile none swap sw 0 0\n",
        )
        .unwrap();

        remove_fstab_entry(&fstab, &PathBuf::from("/swapfile")).unwrap();

        let content = fs::read_to_string(&fstab).unwrap();
        assert!(content.contains("/dev/sda1"));
        assert!(!content.contains("/swapfile"));
    }

    #[test]
    fn test_remove_fstab_entry_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let fstab = dir.path().join("fstab");
        remove_fstab_entry(&fstab, &PathBuf::from("/swapfile")).unwrap();
        assert!(!fstab.exists());
    }

    #[test]
    fn test_swap_create_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.dry_run = true;
        config.backup_root = dir.path().join("backups");
        config.fstab_path = dir.path().join("fstab");
        config.swapfile_path = dir.path().join("swapfile");
        fs::write(&config.fstab_path, "/dev/sda1 / ext4 defaults 0 1\n").unwrap();

        let report = create(&config, 512).unwrap();
        assert_eq!(report.steps_completed, 3);
        assert!(!config.swapfile_path.exists());
        // fstab untouched in dry-run
        let content = fs::read_to_string(&config.fstab_path).unwrap();
        assert!(!content.contains("swapfile"));
    }

    #[test]
    fn test_swap_remove_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.dry_run = true;
        config.backup_root = dir.path().join("backups");
        config.fstab_path = dir.path().join("fstab");
        config.swapfile_path = dir.path().join("swapfile");
        fs::write(&config.fstab_path, "").unwrap();

        let report = remove(&config).unwrap();
        assert_eq!(report.steps_completed, 3);
    }

    #[test]
    fn test_fstab_line_format() {
        assert_eq!(
            fstab_line(&PathBuf::from("/swapfile")),
            "/swapfile none swap sw 0 0"
        );
    }
}
