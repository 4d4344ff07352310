//! Timestamped snapshots of configuration paths, with rotation and restore.
//!
//! Before a mutating procedure touches display-manager config, apt sources or
//! fstab, the affected paths are copied into a fresh snapshot directory under
//! the backup root. A snapshot is either complete or it does not exist: the
//! copy runs in a hidden staging directory and is renamed into place only
//! after every existing source path copied cleanly, so a crash or copy error
//! never publishes a partial snapshot. A `latest` pointer file in the store
//! root records the most recent snapshot's path.
//!
//! Restore is deliberately destructive: each live path is removed and
//! replaced by the snapshot's copy, and paths the manifest recorded as
//! absent at creation time are deleted again, so anything written after the
//! snapshot is gone. An invalid snapshot (a recorded entry missing under it)
//! is refused before the live filesystem is touched.

use crate::error::{Result, StewardError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the pointer file recording the most recent snapshot path
const LATEST_POINTER: &str = "latest";

/// Per-snapshot manifest, written last during creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotManifest {
    /// Creation time, seconds since the epoch
    pub created_secs: u64,
    /// Copied entries: base name under the snapshot dir -> original path
    pub entries: Vec<ManifestEntry>,
    /// Source paths that did not exist at creation time
    pub skipped: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub source: PathBuf,
}

/// A point-in-time copy of a set of filesystem paths
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Identifier: `<epoch-secs>-<seq>`, lexically unrelated but numerically ordered
    pub id: String,
    /// Directory holding the copies and the manifest
    pub dir: PathBuf,
}

impl Snapshot {
    /// Load a snapshot from an existing directory (must contain a manifest)
    pub fn load(dir: &Path) -> Result<Self> {
        let id = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StewardError::snapshot_incomplete("snapshot dir has no name"))?
            .to_string();
        if !dir.join("manifest.json").is_file() {
            return Err(StewardError::snapshot_incomplete(format!(
                "{} has no manifest",
                dir.display()
            )));
        }
        Ok(Self {
            id,
            dir: dir.to_path_buf(),
        })
    }

    /// Read the snapshot's manifest
    pub fn manifest(&self) -> Result<SnapshotManifest> {
        let content = fs::read_to_string(self.dir.join("manifest.json"))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Numeric ordering key parsed from the id, oldest first
    fn order_key(&self) -> (u64, u32) {
        parse_id(&self.id).unwrap_or((0, 0))
    }
}

fn parse_id(id: &str) -> Option<(u64, u32)> {
    let (secs, seq) = id.split_once('-')?;
    Some((secs.parse().ok()?, seq.parse().ok()?))
}

/// Bounded, ordered collection of snapshots under one backup root
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
    max_retained: usize,
}

impl SnapshotStore {
    /// Open (creating if needed) the store at `root`
    pub fn open(root: impl Into<PathBuf>, max_retained: usize) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, max_retained })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_retained(&self) -> usize {
        self.max_retained
    }

    /// Create a snapshot of `paths`.
    ///
    /// Missing source paths are skipped with a warning. A copy error on an
    /// existing path aborts the whole snapshot: the staging directory is
    /// removed and neither the store listing nor the latest pointer changes.
    pub fn create(&self, paths: &[PathBuf]) -> Result<Snapshot> {
        let id = self.next_id()?;
        let staging = self.root.join(format!(".staging-{}", id));
        fs::create_dir_all(&staging)?;

        let result = self.populate(&staging, paths);
        let manifest = match result {
            Ok(manifest) => manifest,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        };

        let manifest_json = serde_json::to_string_pretty(&manifest)?;
        fs::write(staging.join("manifest.json"), manifest_json)?;

        let final_dir = self.root.join(&id);
        fs::rename(&staging, &final_dir)?;
        // Pointer written last: a snapshot is only "latest" once fully published
        fs::write(self.root.join(LATEST_POINTER), final_dir.display().to_string())?;

        info!(
            "Snapshot {} created ({} entries, {} skipped)",
            id,
            manifest.entries.len(),
            manifest.skipped.len()
        );

        Ok(Snapshot { id, dir: final_dir })
    }

    fn populate(&self, staging: &Path, paths: &[PathBuf]) -> Result<SnapshotManifest> {
        let created_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for source in paths {
            if !source.exists() {
                warn!("Snapshot source missing, skipping: {}", source.display());
                skipped.push(source.clone());
                continue;
            }
            let name = source
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    StewardError::snapshot_incomplete(format!(
                        "cannot snapshot path without a base name: {}",
                        source.display()
                    ))
                })?
                .to_string();

            let dest = staging.join(&name);
            copy_recursively(source, &dest)?;
            entries.push(ManifestEntry {
                name,
                source: source.clone(),
            });
        }

        Ok(SnapshotManifest {
            created_secs,
            entries,
            skipped,
        })
    }

    /// Allocate the next snapshot id: epoch seconds plus a sequence suffix
    fn next_id(&self) -> Result<String> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        for seq in 0u32..10_000 {
            let id = format!("{}-{:04}", secs, seq);
            if !self.root.join(&id).exists() && !self.root.join(format!(".staging-{}", id)).exists()
            {
                return Ok(id);
            }
        }
        Err(StewardError::snapshot_incomplete(
            "could not allocate a unique snapshot id",
        ))
    }

    /// All snapshots in the store, newest first
    pub fn list(&self) -> Result<Vec<Snapshot>> {
        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if parse_id(name).is_none() {
                continue; // staging dirs, pointer file, strangers
            }
            match Snapshot::load(&path) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!("Ignoring unreadable snapshot {}: {}", path.display(), e),
            }
        }
        snapshots.sort_by_key(|s| std::cmp::Reverse(s.order_key()));
        Ok(snapshots)
    }

    /// The most recent snapshot, following the pointer file when present
    pub fn latest(&self) -> Result<Option<Snapshot>> {
        let pointer = self.root.join(LATEST_POINTER);
        if pointer.is_file() {
            let recorded = fs::read_to_string(&pointer)?;
            let dir = PathBuf::from(recorded.trim());
            if dir.is_dir() {
                return Ok(Some(Snapshot::load(&dir)?));
            }
            warn!(
                "Latest pointer references missing snapshot {}, falling back to listing",
                dir.display()
            );
        }
        Ok(self.list()?.into_iter().next())
    }

    /// Delete oldest snapshots beyond `max_retained`; returns removed ids
    pub fn rotate(&self) -> Result<Vec<String>> {
        let snapshots = self.list()?;
        let mut removed = Vec::new();
        if snapshots.len() <= self.max_retained {
            return Ok(removed);
        }
        for snapshot in &snapshots[self.max_retained..] {
            info!("Rotating out snapshot {}", snapshot.id);
            fs::remove_dir_all(&snapshot.dir)?;
            removed.push(snapshot.id.clone());
        }
        Ok(removed)
    }

    /// A snapshot is valid iff every expected path (by base name) exists under it
    pub fn verify(&self, snapshot: &Snapshot, expected_paths: &[PathBuf]) -> bool {
        for path in expected_paths {
            let name = match path.file_name() {
                Some(name) => name,
                None => return false,
            };
            if !snapshot.dir.join(name).exists() {
                return false;
            }
        }
        true
    }

    /// Restore `snapshot` over the live filesystem.
    ///
    /// The manifest is the authority on what the snapshot captured: every
    /// recorded entry must still exist under the snapshot dir, or the whole
    /// restore is refused without mutating anything. Sources that were
    /// legitimately absent at creation time sit in the manifest's `skipped`
    /// list, not in `entries`, so they never block a restore.
    ///
    /// Each entry is then mirrored destructively (live path removed, then
    /// replaced by the snapshot copy), and any skipped path that has since
    /// appeared is deleted, returning the live state to what it was when the
    /// snapshot was taken.
    pub fn restore(&self, snapshot: &Snapshot) -> Result<()> {
        let manifest = snapshot.manifest()?;

        for entry in &manifest.entries {
            if !snapshot.dir.join(&entry.name).exists() {
                return Err(StewardError::snapshot_incomplete(format!(
                    "snapshot {} is missing recorded entry {}; refusing to restore",
                    snapshot.id, entry.name
                )));
            }
        }

        for entry in &manifest.entries {
            let copy = snapshot.dir.join(&entry.name);
            let live = &entry.source;

            remove_path(live)?;
            if let Some(parent) = live.parent() {
                fs::create_dir_all(parent)?;
            }
            copy_recursively(&copy, live)?;
            info!("Restored {} from snapshot {}", live.display(), snapshot.id);
        }

        for absent in &manifest.skipped {
            if absent.exists() {
                remove_path(absent)?;
                info!(
                    "Removed {} (absent when snapshot {} was taken)",
                    absent.display(),
                    snapshot.id
                );
            }
        }

        Ok(())
    }
}

/// Remove a file or directory tree if it exists
fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Copy a file or directory tree, preserving permissions where `fs::copy` does
fn copy_recursively(source: &Path, dest: &Path) -> Result<()> {
    if source.is_dir() {
        fs::create_dir_all(dest)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            copy_recursively(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else {
        fs::copy(source, dest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1724400000-0003"), Some((1724400000, 3)));
        assert!(parse_id("latest").is_none());
        assert!(parse_id(".staging-1-2").is_none());
    }

    #[test]
    fn test_copy_recursively_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.conf"), "alpha").unwrap();
        fs::write(src.join("nested/b.conf"), "beta").unwrap();

        let dest = dir.path().join("dest");
        copy_recursively(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("a.conf")).unwrap(), "alpha");
        assert_eq!(
            fs::read_to_string(dest.join("nested/b.conf")).unwrap(),
            "beta"
        );
    }

    #[test]
    fn test_create_skips_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join("live.conf");
        fs::write(&live, "data").unwrap();
        let missing = dir.path().join("ghost.conf");

        let store = SnapshotStore::open(dir.path().join("backups"), 3).unwrap();
        let snapshot = store.create(&[live.clone(), missing.clone()]).unwrap();

        let manifest = snapshot.manifest().unwrap();
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.skipped, vec![missing]);
        assert!(snapshot.dir.join("live.conf").is_file());
    }

    #[test]
    fn test_latest_pointer_tracks_newest() {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join("live.conf");
        fs::write(&live, "one").unwrap();

        let store = SnapshotStore::open(dir.path().join("backups"), 3).unwrap();
        let first = store.create(std::slice::from_ref(&live)).unwrap();
        fs::write(&live, "two").unwrap();
        let second = store.create(std::slice::from_ref(&live)).unwrap();

        assert_ne!(first.id, second.id);
        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }

    #[test]
    fn test_verify_missing_expected_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.conf");
        fs::write(&a, "a").unwrap();

        let store = SnapshotStore::open(dir.path().join("backups"), 3).unwrap();
        let snapshot = store.create(std::slice::from_ref(&a)).unwrap();

        assert!(store.verify(&snapshot, std::slice::from_ref(&a)));
        let b = dir.path().join("b.conf");
        assert!(!store.verify(&snapshot, &[a, b]));
    }

    #[test]
    fn test_restore_refuses_invalid_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.conf");
        fs::write(&a, "original").unwrap();

        let store = SnapshotStore::open(dir.path().join("backups"), 3).unwrap();
        let snapshot = store.create(std::slice::from_ref(&a)).unwrap();

        // a recorded entry vanishing from under the snapshot makes it invalid
        fs::remove_file(snapshot.dir.join("a.conf")).unwrap();
        fs::write(&a, "mutated").unwrap();

        let err = store.restore(&snapshot).unwrap_err();
        assert!(matches!(err, StewardError::SnapshotIncomplete(_)));
        // live file untouched by the refused restore
        assert_eq!(fs::read_to_string(&a).unwrap(), "mutated");
    }

    #[test]
    fn test_restore_accepts_snapshot_with_skipped_sources() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.conf");
        fs::write(&a, "original").unwrap();
        let ghost = dir.path().join("ghost.conf");

        let store = SnapshotStore::open(dir.path().join("backups"), 3).unwrap();
        let snapshot = store.create(&[a.clone(), ghost.clone()]).unwrap();

        // a source that was absent at creation time never blocks a restore
        fs::write(&a, "mutated").unwrap();
        store.restore(&snapshot).unwrap();
        assert_eq!(fs::read_to_string(&a).unwrap(), "original");
    }

    #[test]
    fn test_restore_removes_paths_created_after_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.conf");
        fs::write(&a, "original").unwrap();
        let keyrings = dir.path().join("keyrings");

        let store = SnapshotStore::open(dir.path().join("backups"), 3).unwrap();
        let snapshot = store.create(&[a.clone(), keyrings.clone()]).unwrap();

        // the skipped directory appears after the snapshot was taken
        fs::create_dir_all(&keyrings).unwrap();
        fs::write(keyrings.join("vendor.gpg"), "key").unwrap();

        store.restore(&snapshot).unwrap();
        assert!(!keyrings.exists());
        assert_eq!(fs::read_to_string(&a).unwrap(), "original");
    }

    #[test]
    fn test_restore_mirrors_directory() {
        let dir = tempfile::tempdir().unwrap();
        let conf_dir = dir.path().join("lightdm");
        fs::create_dir_all(&conf_dir).unwrap();
        fs::write(conf_dir.join("lightdm.conf"), "greeter=a").unwrap();

        let store = SnapshotStore::open(dir.path().join("backups"), 3).unwrap();
        let snapshot = store.create(std::slice::from_ref(&conf_dir)).unwrap();

        // mutate after the snapshot: edit one file, add a stray one
        fs::write(conf_dir.join("lightdm.conf"), "greeter=b").unwrap();
        fs::write(conf_dir.join("stray.conf"), "junk").unwrap();

        store.restore(&snapshot).unwrap();

        assert_eq!(
            fs::read_to_string(conf_dir.join("lightdm.conf")).unwrap(),
            "greeter=a"
        );
        // destructive mirror: the stray file is gone
        assert!(!conf_dir.join("stray.conf").exists());
    }

    #[test]
    fn test_rotate_removes_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join("live.conf");
        fs::write(&live, "data").unwrap();

        let store = SnapshotStore::open(dir.path().join("backups"), 3).unwrap();
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(store.create(std::slice::from_ref(&live)).unwrap().id);
        }

        let removed = store.rotate().unwrap();
        assert_eq!(removed, vec![ids[0].clone()]);

        let remaining = store.list().unwrap();
        assert_eq!(remaining.len(), 3);
        assert_eq!(remaining[0].id, ids[3]);
    }

    #[test]
    fn test_rotate_under_bound_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join("live.conf");
        fs::write(&live, "data").unwrap();

        let store = SnapshotStore::open(dir.path().join("backups"), 3).unwrap();
        store.create(std::slice::from_ref(&live)).unwrap();
        store.create(std::slice::from_ref(&live)).unwrap();

        assert!(store.rotate().unwrap().is_empty());
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_create_aborts_on_unnamed_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("backups"), 3).unwrap();
        // "/" exists but has no base name; the whole snapshot must abort
        let err = store.create(&[PathBuf::from("/")]).unwrap_err();
        assert!(matches!(err, StewardError::SnapshotIncomplete(_)));
        assert!(store.list().unwrap().is_empty());
        assert!(store.latest().unwrap().is_none());
    }
}
