pub mod parse;
pub mod prune;
pub mod status;
pub mod sync;

use std::path::Path;

use anyhow::Result;
use shiftsync_core::config::{CycleConfig, ShiftSyncConfig};

pub fn load_config(path: Option<&Path>) -> Result<ShiftSyncConfig> {
    Ok(ShiftSyncConfig::load(path)?)
}

/// Resolve the cycle settings, falling back to this machine's zone.
pub fn cycle_config(config: &ShiftSyncConfig) -> Result<CycleConfig> {
    let host_zone = iana_time_zone::get_timezone()
        .inspect_err(|e| log::debug!("could not read host timezone: {e}"))
        .ok();
    Ok(config.cycle_config(host_zone.as_deref())?)
}
