use anyhow::{Context, Result};
use chrono::Local;
use owo_colors::OwoColorize;
use shiftsync_core::config::ShiftSyncConfig;
use shiftsync_core::exports::prune_exports;

pub fn run(config: &ShiftSyncConfig) -> Result<()> {
    let dir = config
        .export_path()
        .context("Could not determine the export directory")?;

    if config.retention_days < 0 {
        println!("{}", "Retention is disabled; nothing pruned".dimmed());
        return Ok(());
    }

    let removed = prune_exports(&dir, config.retention_days, &Local::now())?;
    println!(
        "Removed {} export(s) older than {} days from {}",
        removed,
        config.retention_days,
        dir.display().dimmed()
    );

    Ok(())
}
