use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use shiftsync_core::config::ShiftSyncConfig;
use shiftsync_core::cycle::{CycleReport, SyncMode, run_cycle};
use shiftsync_core::remote::{Provider, ProviderStore};
use shiftsync_core::render::{Renderer, RendererProcess};

use super::cycle_config;
use crate::notify::WebhookNotifier;
use crate::render::render_report;
use crate::snapshot_dir::SnapshotDir;
use crate::utils::tui::create_spinner;

pub async fn run(config: &ShiftSyncConfig, snapshots: Option<&Path>, dry_run: bool) -> Result<()> {
    let mode = if dry_run {
        SyncMode::DryRun
    } else {
        SyncMode::Apply
    };

    let report = match snapshots {
        Some(dir) => {
            let mut renderer = SnapshotDir::open(dir)?;
            execute(config, &mut renderer, mode).await?
        }
        None => {
            let renderer_config = config
                .renderer
                .as_ref()
                .context("No [renderer] configured; set one up or pass --snapshots <dir>")?;
            let mut renderer =
                RendererProcess::spawn(&renderer_config.provider, renderer_config.params.clone())?;
            let report = execute(config, &mut renderer, mode).await;
            if let Err(e) = renderer.shutdown().await {
                log::warn!("renderer shutdown: {e}");
            }
            report?
        }
    };

    println!("{}", render_report(&report));
    Ok(())
}

async fn execute<R: Renderer>(
    config: &ShiftSyncConfig,
    renderer: &mut R,
    mode: SyncMode,
) -> Result<CycleReport> {
    let cycle = cycle_config(config)?;

    let store_config = config
        .store
        .as_ref()
        .context("No [store] configured in the config file")?;
    let store = ProviderStore::new(
        Provider::from_name(&store_config.provider),
        store_config.params.clone(),
    );

    let notifier = config
        .notify
        .webhook_url
        .as_deref()
        .map(WebhookNotifier::new);

    let spinner = create_spinner(format!("📅 {}", "Reading schedule".bold()));
    let result = run_cycle(&cycle, renderer, &store, &notifier, mode).await;
    spinner.finish_and_clear();

    Ok(result?)
}
