mod commands;
mod notify;
mod render;
mod snapshot_dir;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shiftsync")]
#[command(about = "Sync your work schedule page to a calendar")]
struct Cli {
    /// Config file (defaults to ~/.config/shiftsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging (RUST_LOG still wins)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the schedule and bring the calendar in line with it
    Sync {
        /// Show what would change without touching the calendar
        #[arg(long)]
        dry_run: bool,

        /// Read saved *.html pages from this directory instead of the renderer
        #[arg(long)]
        snapshots: Option<PathBuf>,
    },
    /// Show what a sync would change
    Status {
        #[arg(long)]
        snapshots: Option<PathBuf>,
    },
    /// Parse saved schedule pages and print the shifts found
    Parse {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also write the shifts to this .ics file
        #[arg(long)]
        ics: Option<PathBuf>,
    },
    /// Delete exports older than the retention period
    Prune,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Sync { dry_run, snapshots } => {
            commands::sync::run(&config, snapshots.as_deref(), dry_run).await
        }
        Commands::Status { snapshots } => {
            commands::status::run(&config, snapshots.as_deref()).await
        }
        Commands::Parse { files, ics } => commands::parse::run(&config, files, ics.as_deref()).await,
        Commands::Prune => commands::prune::run(&config),
    }
}
