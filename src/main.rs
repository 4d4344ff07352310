//! debsteward - Main entry point
//!
//! Builds the configuration, runs pre-flight checks and dispatches exactly
//! one operation per invocation.

use log::{debug, error, info};

use debsteward::cli::{
    Cli, Commands, DesktopCommands, InstallCommands, RepoCommands, SnapshotCommands, SwapCommands,
};
use debsteward::{ops, sanity, Config, Result};

/// Initialize the logger with appropriate settings
fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;

    Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env() // Allows RUST_LOG env var to override
        .init();
}

/// Main application entry point
fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logger();
    info!("debsteward starting up");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration overrides from {:?}", path);
            Config::load_from_file(path)?
        }
        None => Config::default(),
    };
    config.validate()?;
    config.dry_run = cli.dry_run;
    if config.dry_run {
        info!("Dry-run mode: destructive operations will be skipped");
    }

    if cli.command.needs_preflight() {
        if let Err(e) = sanity::run_preflight_checks(&config) {
            error!("{}", e);
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = dispatch(&cli.command, &config) {
        error!("{}", e);
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn dispatch(command: &Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Desktop { action } => match action {
            DesktopCommands::Switch { to, keep_old } => {
                let report = ops::desktop::switch(config, *to, *keep_old)?;
                println!(
                    "✓ Switched to {} ({} steps, snapshot {})",
                    to,
                    report.steps_completed,
                    report.snapshot_id.as_deref().unwrap_or("none")
                );
            }
            DesktopCommands::Status => {
                for (de, installed) in ops::desktop::status()? {
                    let mark = if installed { "installed" } else { "not installed" };
                    println!("{:<10} {}", de.to_string(), mark);
                }
            }
        },
        Commands::Install { target } => match target {
            InstallCommands::Editor => {
                let report = ops::packages::install_editor(config)?;
                println!(
                    "✓ Editor installed ({} steps, snapshot {})",
                    report.steps_completed,
                    report.snapshot_id.as_deref().unwrap_or("none")
                );
            }
            InstallCommands::DbTools => {
                let report = ops::packages::install_db_tools(config)?;
                println!(
                    "✓ Database tools installed ({} steps)",
                    report.steps_completed
                );
            }
        },
        Commands::Swap { action } => match action {
            SwapCommands::Create { size_mb } => {
                let report = ops::swap::create(config, *size_mb)?;
                println!(
                    "✓ Swapfile created ({} MiB, {} steps)",
                    size_mb, report.steps_completed
                );
            }
            SwapCommands::Remove => {
                let report = ops::swap::remove(config)?;
                println!("✓ Swapfile removed ({} steps)", report.steps_completed);
            }
            SwapCommands::Status => {
                print!("{}", ops::swap::status()?);
            }
        },
        Commands::Repo { action } => match action {
            RepoCommands::Clean => {
                let report = ops::repo::clean(config)?;
                println!(
                    "✓ Repository cleanup done ({} steps, snapshot {})",
                    report.steps_completed,
                    report.snapshot_id.as_deref().unwrap_or("none")
                );
            }
        },
        Commands::Snapshot { action } => {
            let store = ops::open_store(config)?;
            match action {
                SnapshotCommands::List => {
                    let snapshots = store.list()?;
                    if snapshots.is_empty() {
                        println!("No snapshots retained under {}", store.root().display());
                    }
                    for snapshot in snapshots {
                        let manifest = snapshot.manifest()?;
                        println!(
                            "{}  {} entries  {}",
                            snapshot.id,
                            manifest.entries.len(),
                            snapshot.dir.display()
                        );
                    }
                }
                SnapshotCommands::Prune => {
                    let removed = store.rotate()?;
                    if removed.is_empty() {
                        println!("Nothing to prune ({} retained max)", store.max_retained());
                    } else {
                        println!(
                            "Pruned {} snapshot(s): {}",
                            removed.len(),
                            removed.join(", ")
                        );
                    }
                }
            }
        }
    }
    Ok(())
}
