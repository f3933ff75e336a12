//! Export files: one timestamped ICS per cycle, pruned by age.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone};

use crate::error::ShiftSyncResult;

const PREFIX: &str = "schedule_";
const SUFFIX: &str = ".ics";
const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// `<dir>/schedule_<YYYY-MM-DD_HH-MM-SS>.ics`
pub fn export_path<Z: TimeZone>(dir: &Path, now: &DateTime<Z>) -> PathBuf
where
    Z::Offset: std::fmt::Display,
{
    dir.join(format!("{PREFIX}{}{SUFFIX}", now.format(STAMP_FORMAT)))
}

pub fn write_export(dir: &Path, now: &DateTime<Local>, ics: &str) -> ShiftSyncResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = export_path(dir, now);
    fs::write(&path, ics)?;
    Ok(path)
}

/// Timestamp encoded in an export file name.
fn export_stamp(file_name: &str) -> Option<NaiveDateTime> {
    let stamp = file_name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
}

/// Delete exports older than `retention_days` and return how many went.
///
/// Negative retention disables pruning, as does a retention reaching past
/// the earliest representable date. Files that are not exports are never
/// touched.
pub fn prune_exports(
    dir: &Path,
    retention_days: i64,
    now: &DateTime<Local>,
) -> ShiftSyncResult<usize> {
    if retention_days < 0 || !dir.exists() {
        return Ok(0);
    }

    let Some(cutoff) = TimeDelta::try_days(retention_days)
        .and_then(|age| now.naive_local().checked_sub_signed(age))
    else {
        log::debug!("retention of {retention_days} days reaches past any export");
        return Ok(0);
    };
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(stamp) = name.to_str().and_then(export_stamp) else {
            continue;
        };
        if stamp < cutoff {
            fs::remove_file(entry.path())?;
            log::debug!("pruned {}", entry.path().display());
            removed += 1;
        }
    }

    if removed > 0 {
        log::info!("pruned {removed} export(s) older than {retention_days} days");
    }
    Ok(removed)
}
