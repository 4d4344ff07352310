//! debsteward library
//!
//! Snapshot-guarded system administration for Debian desktops: desktop
//! environment switching, vendor package installation, swap management and
//! repository cleanup, built on ordered-fallback acquisition and a
//! timestamped snapshot/restore store.

pub mod acquire;
pub mod apt;
pub mod cli;
pub mod config;
pub mod error;
pub mod keyring;
pub mod ops;
pub mod procedure;
pub mod sanity;
pub mod snapshot;
pub mod system;
pub mod types;

// Re-export main types for convenience
pub use acquire::{acquire, AcquisitionRequest, FnStrategy, Strategy};
pub use config::Config;
pub use error::{Result, StewardError};
pub use keyring::KeySpec;
pub use procedure::{run_procedure, ProcedureReport, Step};
pub use snapshot::{Snapshot, SnapshotManifest, SnapshotStore};
pub use system::CmdOutput;
pub use types::{DesktopEnvironment, DisplayManager};
