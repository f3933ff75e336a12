//! Offline renderer over saved page snapshots.
//!
//! Each `*.html` file is one period, in file-name order. A sibling
//! `<stem>.columns.json` holding `{"0": "2025-08-17", ...}` stands in for
//! the live column map. Day cells cannot be clicked, so the detail-panel
//! fallback finds nothing here.

use std::path::{Path, PathBuf};

use shiftsync_core::error::{ShiftSyncError, ShiftSyncResult};
use shiftsync_core::parse::{DayCell, LiveColumnMap};
use shiftsync_core::render::Renderer;

pub struct SnapshotDir {
    pages: Vec<PathBuf>,
    current: usize,
}

impl SnapshotDir {
    pub fn open(dir: &Path) -> ShiftSyncResult<Self> {
        let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "html"))
            .collect();
        pages.sort();

        if pages.is_empty() {
            log::warn!("no *.html snapshots in {}", dir.display());
        }
        Ok(Self::from_files(pages))
    }

    pub fn from_files(pages: Vec<PathBuf>) -> Self {
        SnapshotDir { pages, current: 0 }
    }

    fn columns_path(page: &Path) -> Option<PathBuf> {
        let stem = page.file_stem()?.to_string_lossy();
        Some(page.with_file_name(format!("{stem}.columns.json")))
    }
}

impl Renderer for SnapshotDir {
    async fn reset(&mut self) -> ShiftSyncResult<()> {
        self.current = 0;
        Ok(())
    }

    async fn snapshot(&mut self) -> ShiftSyncResult<Option<String>> {
        match self.pages.get(self.current) {
            Some(path) => Ok(Some(tokio::fs::read_to_string(path).await?)),
            None => Ok(None),
        }
    }

    async fn column_dates(&mut self) -> ShiftSyncResult<Option<LiveColumnMap>> {
        let Some(path) = self.pages.get(self.current).and_then(|p| Self::columns_path(p)) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let raw = tokio::fs::read_to_string(&path).await?;
        let columns = serde_json::from_str(&raw).map_err(|e| {
            ShiftSyncError::Serialization(format!("{}: {e}", path.display()))
        })?;
        Ok(Some(columns))
    }

    async fn select_day(&mut self, _cell: &DayCell) -> ShiftSyncResult<bool> {
        Ok(false)
    }

    async fn panel_text(&mut self) -> ShiftSyncResult<Option<String>> {
        Ok(None)
    }

    async fn next_period(&mut self) -> ShiftSyncResult<bool> {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use shiftsync_core::config::CycleConfig;
    use shiftsync_core::cycle::crawl;
    use shiftsync_core::merge::canonicalize;
    use tempfile::TempDir;

    const WEEK: &str = r#"<table>
        <thead><tr><th>Fri</th><th>Sat</th></tr></thead>
        <tbody><tr>
          <td><span class="fc-time">10:00 am - 6:00 pm</span></td>
          <td><span class="fc-time">7:00 am - 4:00 pm</span></td>
        </tr></tbody>
      </table>"#;

    #[tokio::test]
    async fn test_pages_in_name_order_with_column_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.html"), WEEK).unwrap();
        std::fs::write(
            dir.path().join("b.columns.json"),
            r#"{"0": "2025-08-22", "1": "2025-08-23"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("a.html"), "<p>empty week</p>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut renderer = SnapshotDir::open(dir.path()).unwrap();
        renderer.reset().await.unwrap();

        assert_eq!(renderer.snapshot().await.unwrap().unwrap(), "<p>empty week</p>");
        assert!(renderer.column_dates().await.unwrap().is_none());
        assert!(renderer.next_period().await.unwrap());

        let columns = renderer.column_dates().await.unwrap().unwrap();
        assert_eq!(columns.get(&1).map(String::as_str), Some("2025-08-23"));
        assert!(!renderer.next_period().await.unwrap());
    }

    #[tokio::test]
    async fn test_crawl_over_snapshots() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("week.html"), WEEK).unwrap();
        std::fs::write(
            dir.path().join("week.columns.json"),
            r#"{"0": "2025-08-22", "1": "2025-08-23"}"#,
        )
        .unwrap();

        let mut renderer = SnapshotDir::open(dir.path()).unwrap();
        let config = CycleConfig::new(New_York, "Work");
        let shifts = canonicalize(crawl(&mut renderer, &config).await.unwrap());

        let found: Vec<String> = shifts.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            found,
            vec!["2025-08-22 10:00–18:00 Work", "2025-08-23 07:00–16:00 Work"]
        );
    }
}
