//! Top-level steward operations, one module per CLI area.
//!
//! Each operation builds its protected-path set, opens the snapshot store and
//! hands a fixed step list to `procedure::run_procedure`. No operation talks
//! to the system except through `apt`, `system` and the acquisition chain.

pub mod desktop;
pub mod packages;
pub mod repo;
pub mod swap;

use crate::config::Config;
use crate::error::Result;
use crate::snapshot::SnapshotStore;

/// Open the snapshot store configured for this host
pub fn open_store(config: &Config) -> Result<SnapshotStore> {
    SnapshotStore::open(&config.backup_root, config.max_snapshots)
}
