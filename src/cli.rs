use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::DesktopEnvironment;

/// debsteward - snapshot-guarded system administration for Debian desktops
#[derive(Parser)]
#[command(name = "debsteward")]
#[command(about = "Desktop switching, vendor repos, swap and repository cleanup with rollback")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// Destructive operations (installs, purges, file removal) are skipped
    /// and logged. Read-only queries still execute so the preview is
    /// realistic.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Path to a JSON configuration file overriding the defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Desktop environment switching and status
    Desktop {
        #[command(subcommand)]
        action: DesktopCommands,
    },
    /// Install curated package sets
    Install {
        #[command(subcommand)]
        target: InstallCommands,
    },
    /// Swapfile management
    Swap {
        #[command(subcommand)]
        action: SwapCommands,
    },
    /// Third-party repository maintenance
    Repo {
        #[command(subcommand)]
        action: RepoCommands,
    },
    /// Snapshot store inspection and pruning
    Snapshot {
        #[command(subcommand)]
        action: SnapshotCommands,
    },
}

impl Commands {
    /// Whether the command needs the host preflight (root, target distro,
    /// required binaries) before running.
    ///
    /// Status queries and snapshot-store maintenance never touch the package
    /// manager or system services, so they run anywhere.
    pub fn needs_preflight(&self) -> bool {
        !matches!(
            self,
            Commands::Snapshot { .. }
                | Commands::Desktop {
                    action: DesktopCommands::Status
                }
                | Commands::Swap {
                    action: SwapCommands::Status
                }
        )
    }
}

#[derive(Subcommand)]
pub enum DesktopCommands {
    /// Switch to a different desktop environment
    Switch {
        /// Target environment (xfce, kde, gnome, cinnamon)
        #[arg(short, long)]
        to: DesktopEnvironment,
        /// Keep the previous environment installed instead of purging it
        #[arg(long)]
        keep_old: bool,
    },
    /// Show which known environments are installed
    Status,
}

#[derive(Subcommand)]
pub enum InstallCommands {
    /// Install the editor from its vendor repository
    Editor,
    /// Install the database client tool set
    DbTools,
}

#[derive(Subcommand)]
pub enum SwapCommands {
    /// Create, activate and persist a swapfile
    Create {
        /// Swapfile size in MiB
        #[arg(short, long, default_value = "2048")]
        size_mb: u64,
    },
    /// Deactivate and remove the managed swapfile
    Remove,
    /// Show active swap devices
    Status,
}

#[derive(Subcommand)]
pub enum RepoCommands {
    /// Remove third-party sources and keyrings, then refresh package lists
    Clean,
}

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// List retained snapshots, newest first
    List,
    /// Delete snapshots beyond the retention bound
    Prune,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_requires_command() {
        let result = Cli::try_parse_from(["debsteward"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_desktop_switch() {
        let cli = Cli::try_parse_from(["debsteward", "desktop", "switch", "--to", "kde"]).unwrap();
        match cli.command {
            Commands::Desktop {
                action: DesktopCommands::Switch { to, keep_old },
            } => {
                assert_eq!(to, DesktopEnvironment::Kde);
                assert!(!keep_old);
            }
            _ => panic!("Expected desktop switch command"),
        }
    }

    #[test]
    fn test_cli_desktop_switch_rejects_unknown_de() {
        let result = Cli::try_parse_from(["debsteward", "desktop", "switch", "--to", "unity"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_swap_create_default_size() {
        let cli = Cli::try_parse_from(["debsteward", "swap", "create"]).unwrap();
        match cli.command {
            Commands::Swap {
                action: SwapCommands::Create { size_mb },
            } => assert_eq!(size_mb, 2048),
            _ => panic!("Expected swap create command"),
        }
    }

    #[test]
    fn test_cli_global_dry_run() {
        let cli =
            Cli::try_parse_from(["debsteward", "repo", "clean", "--dry-run"]).unwrap();
        assert!(cli.dry_run);
        assert!(matches!(
            cli.command,
            Commands::Repo {
                action: RepoCommands::Clean
            }
        ));
    }

    #[test]
    fn test_cli_config_path() {
        let cli = Cli::try_parse_from([
            "debsteward",
            "--config",
            "/etc/debsteward.json",
            "install",
            "editor",
        ])
        .unwrap();
        assert_eq!(
            cli.config.unwrap().to_str().unwrap(),
            "/etc/debsteward.json"
        );
        assert!(matches!(
            cli.command,
            Commands::Install {
                target: InstallCommands::Editor
            }
        ));
    }

    #[test]
    fn test_cli_snapshot_commands() {
        assert!(Cli::try_parse_from(["debsteward", "snapshot", "list"]).is_ok());
        assert!(Cli::try_parse_from(["debsteward", "snapshot", "prune"]).is_ok());
    }

    #[test]
    fn test_status_queries_skip_preflight() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().command;

        assert!(!parse(&["debsteward", "desktop", "status"]).needs_preflight());
        assert!(!parse(&["debsteward", "swap", "status"]).needs_preflight());
        assert!(!parse(&["debsteward", "snapshot", "list"]).needs_preflight());

        assert!(parse(&["debsteward", "swap", "create"]).needs_preflight());
        assert!(parse(&["debsteward", "desktop", "switch", "--to", "kde"]).needs_preflight());
        assert!(parse(&["debsteward", "repo", "clean"]).needs_preflight());
    }
}
