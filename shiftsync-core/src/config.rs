//! Configuration at ~/.config/shiftsync/config.toml, overridable through
//! `SHIFTSYNC_*` environment variables (`SHIFTSYNC_CRAWL__MAX_PAGES=5`).
//!
//! The file is read once at process start and turned into a
//! [`CycleConfig`], which is all the cycle ever sees.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{ShiftSyncError, ShiftSyncResult};

pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_LABEL: &str = "Work";
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS
}

fn default_max_pages() -> usize {
    3
}

fn default_attempts() -> usize {
    3
}

fn default_retry_delay() -> String {
    "3s".to_string()
}

#[derive(Deserialize, Clone, Debug)]
pub struct ShiftSyncConfig {
    /// IANA zone shifts are read in; the host zone when unset
    pub timezone: Option<String>,

    /// Summary of every synced event
    #[serde(default = "default_label")]
    pub label: String,

    pub export_dir: Option<PathBuf>,

    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    #[serde(default)]
    pub crawl: CrawlConfig,

    pub renderer: Option<CollaboratorConfig>,
    pub store: Option<CollaboratorConfig>,

    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CrawlConfig {
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_attempts")]
    pub attempts: usize,
    /// humantime duration, e.g. "3s"
    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,
    pub max_panel_cells: Option<usize>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            max_pages: default_max_pages(),
            attempts: default_attempts(),
            retry_delay: default_retry_delay(),
            max_panel_cells: None,
        }
    }
}

/// A renderer or store provider plus the parameters forwarded to it.
#[derive(Deserialize, Clone, Debug)]
pub struct CollaboratorConfig {
    pub provider: String,
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
}

/// Everything one cycle needs, resolved and validated.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub zone: Tz,
    pub label: String,
    pub max_pages: usize,
    pub attempts: usize,
    pub retry_delay: Duration,
    pub max_panel_cells: Option<usize>,
    /// Where ICS exports go; no export when `None`
    pub export_dir: Option<PathBuf>,
    pub retention_days: i64,
}

impl CycleConfig {
    /// Defaults for `zone`, writing no exports.
    pub fn new(zone: Tz, label: impl Into<String>) -> Self {
        CycleConfig {
            zone,
            label: label.into(),
            max_pages: default_max_pages(),
            attempts: default_attempts(),
            retry_delay: Duration::from_secs(3),
            max_panel_cells: None,
            export_dir: None,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl ShiftSyncConfig {
    pub fn config_path() -> ShiftSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ShiftSyncError::Config("Could not determine config directory".into()))?
            .join("shiftsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path` (or the default location), creating a commented
    /// default file first if there is none.
    pub fn load(path: Option<&Path>) -> ShiftSyncResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(
                Environment::with_prefix("SHIFTSYNC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ShiftSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ShiftSyncError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ShiftSyncResult<()> {
        let contents = format!(
            "\
# shiftsync configuration

# Zone the schedule is shown in (defaults to this machine's zone):
# timezone = \"{DEFAULT_TIMEZONE}\"

# Summary given to every synced event:
# label = \"{DEFAULT_LABEL}\"

# Where schedule_*.ics exports are written, and for how many days they are kept
# (negative keeps them forever):
# export_dir = \"~/.local/share/shiftsync/exports\"
# retention_days = {DEFAULT_RETENTION_DAYS}

# [crawl]
# max_pages = 3
# attempts = 3
# retry_delay = \"3s\"
# max_panel_cells = 42

# [renderer]
# provider = \"chromium\"       # runs shiftsync-renderer-chromium

# [store]
# provider = \"google\"         # runs shiftsync-store-google
# calendar_id = \"primary\"

# [notify]
# webhook_url = \"https://discord.com/api/webhooks/...\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ShiftSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ShiftSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Export directory with `~` expanded, falling back to the data dir.
    pub fn export_path(&self) -> Option<PathBuf> {
        match &self.export_dir {
            Some(dir) => Some(PathBuf::from(
                shellexpand::tilde(&dir.to_string_lossy()).into_owned(),
            )),
            None => dirs::data_dir().map(|d| d.join("shiftsync").join("exports")),
        }
    }

    /// Resolve the zone (configured, else `host_zone`, else New York) and
    /// validate the crawl settings.
    pub fn cycle_config(&self, host_zone: Option<&str>) -> ShiftSyncResult<CycleConfig> {
        let zone_name = self
            .timezone
            .as_deref()
            .or(host_zone)
            .unwrap_or(DEFAULT_TIMEZONE);
        let zone: Tz = zone_name
            .parse()
            .map_err(|_| ShiftSyncError::Config(format!("Unknown timezone '{zone_name}'")))?;

        if self.crawl.max_pages == 0 {
            return Err(ShiftSyncError::Config("crawl.max_pages must be at least 1".into()));
        }
        if self.crawl.attempts == 0 {
            return Err(ShiftSyncError::Config("crawl.attempts must be at least 1".into()));
        }
        let retry_delay = humantime::parse_duration(&self.crawl.retry_delay).map_err(|e| {
            ShiftSyncError::Config(format!("Invalid crawl.retry_delay '{}': {e}", self.crawl.retry_delay))
        })?;

        Ok(CycleConfig {
            zone,
            label: self.label.clone(),
            max_pages: self.crawl.max_pages,
            attempts: self.crawl.attempts,
            retry_delay,
            max_panel_cells: self.crawl.max_panel_cells,
            export_dir: self.export_path(),
            retention_days: self.retention_days,
        })
    }
}
