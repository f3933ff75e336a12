use std::path::Path;

use anyhow::Result;
use shiftsync_core::config::ShiftSyncConfig;

/// A sync that only lists and reports.
pub async fn run(config: &ShiftSyncConfig, snapshots: Option<&Path>) -> Result<()> {
    super::sync::run(config, snapshots, true).await
}
