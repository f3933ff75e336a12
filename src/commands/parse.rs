use std::path::{Path, PathBuf};

use anyhow::Result;
use owo_colors::OwoColorize;
use shiftsync_core::config::ShiftSyncConfig;
use shiftsync_core::cycle::crawl;
use shiftsync_core::ics::generate_schedule_ics;
use shiftsync_core::merge::canonicalize;

use super::cycle_config;
use crate::render::Render;
use crate::snapshot_dir::SnapshotDir;

/// Parse saved pages offline, one page per file, in the order given.
pub async fn run(config: &ShiftSyncConfig, files: Vec<PathBuf>, ics: Option<&Path>) -> Result<()> {
    let mut cycle = cycle_config(config)?;
    cycle.max_pages = files.len().max(1);

    let mut renderer = SnapshotDir::from_files(files);
    let shifts = canonicalize(crawl(&mut renderer, &cycle).await?);

    if shifts.is_empty() {
        println!("{}", "No shifts found".yellow());
    }
    for shift in &shifts {
        println!("   {}", shift.render());
    }

    if let Some(path) = ics {
        std::fs::write(path, generate_schedule_ics(&shifts))?;
        println!("\nWrote {} shift(s) to {}", shifts.len(), path.display());
    }

    Ok(())
}
