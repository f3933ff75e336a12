//! Test doubles for the renderer, remote store, and notifier.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use chrono::{Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::America::New_York;

use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::notify::Notifier;
use crate::parse::{DayCell, LiveColumnMap};
use crate::remote::RemoteStore;
use crate::render::Renderer;
use crate::shift::{RemoteEvent, Shift};
use crate::sync_window::SyncWindow;

/// `Work` shift in New York, e.g. `shift("2025-08-17", "07:00", "16:00")`.
/// An end at or before the start lands on the next day.
pub fn shift(date: &str, start: &str, end: &str) -> Shift {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let start_time = NaiveTime::parse_from_str(start, "%H:%M").unwrap();
    let end_time = NaiveTime::parse_from_str(end, "%H:%M").unwrap();
    let end_date = if end_time <= start_time {
        date.checked_add_days(Days::new(1)).unwrap()
    } else {
        date
    };

    Shift::new(
        New_York
            .from_local_datetime(&date.and_time(start_time))
            .single()
            .unwrap(),
        New_York
            .from_local_datetime(&end_date.and_time(end_time))
            .single()
            .unwrap(),
        "Work",
    )
}

pub fn remote(id: &str, date: &str, start: &str, end: &str) -> RemoteEvent {
    let shift = shift(date, start, end);
    RemoteEvent {
        remote_id: id.to_string(),
        label: shift.label.clone(),
        start: shift.start.fixed_offset(),
        end: shift.end.fixed_offset(),
    }
}

/// Renderer replaying fixed pages and panels.
#[derive(Debug, Default)]
pub struct ScriptedRenderer {
    pages: Vec<String>,
    columns: BTreeMap<usize, LiveColumnMap>,
    panels: BTreeMap<NaiveDate, String>,
    failing_selects: HashSet<NaiveDate>,
    failing_navigation: bool,
    failing_columns: bool,
    /// Attempts (counted by `reset`) whose snapshots come back empty
    blank_attempts: usize,
    current: usize,
    focused: Option<NaiveDate>,
    pub resets: usize,
    pub selected: Vec<NaiveDate>,
    pub snapshots_taken: usize,
}

impl ScriptedRenderer {
    pub fn with_page(mut self, html: &str) -> Self {
        self.pages.push(html.to_string());
        self
    }

    /// Live column map for the most recently added page.
    pub fn with_columns(mut self, columns: &[(usize, &str)]) -> Self {
        let page = self.pages.len().saturating_sub(1);
        self.columns.insert(
            page,
            columns.iter().map(|(i, d)| (*i, d.to_string())).collect(),
        );
        self
    }

    pub fn with_panel(mut self, date: NaiveDate, text: &str) -> Self {
        self.panels.insert(date, text.to_string());
        self
    }

    pub fn with_failing_select(mut self, date: NaiveDate) -> Self {
        self.failing_selects.insert(date);
        self
    }

    /// `next_period` errors instead of advancing.
    pub fn with_failing_navigation(mut self) -> Self {
        self.failing_navigation = true;
        self
    }

    pub fn with_failing_columns(mut self) -> Self {
        self.failing_columns = true;
        self
    }

    pub fn with_blank_attempts(mut self, attempts: usize) -> Self {
        self.blank_attempts = attempts;
        self
    }

    fn blank(&self) -> bool {
        self.blank_attempts > 0 && self.resets <= self.blank_attempts
    }
}

impl Renderer for ScriptedRenderer {
    async fn reset(&mut self) -> ShiftSyncResult<()> {
        self.resets += 1;
        self.current = 0;
        self.focused = None;
        Ok(())
    }

    async fn snapshot(&mut self) -> ShiftSyncResult<Option<String>> {
        self.snapshots_taken += 1;
        if self.blank() {
            return Ok(None);
        }
        Ok(self.pages.get(self.current).cloned())
    }

    async fn column_dates(&mut self) -> ShiftSyncResult<Option<LiveColumnMap>> {
        if self.failing_columns {
            return Err(ShiftSyncError::Renderer("column lookup script failed".into()));
        }
        Ok(self.columns.get(&self.current).cloned())
    }

    async fn select_day(&mut self, cell: &DayCell) -> ShiftSyncResult<bool> {
        self.selected.push(cell.date);
        if self.failing_selects.contains(&cell.date) {
            return Err(ShiftSyncError::Renderer(format!("{} is not clickable", cell.date)));
        }
        self.focused = Some(cell.date);
        Ok(true)
    }

    async fn panel_text(&mut self) -> ShiftSyncResult<Option<String>> {
        Ok(self.focused.and_then(|d| self.panels.get(&d).cloned()))
    }

    async fn next_period(&mut self) -> ShiftSyncResult<bool> {
        if self.failing_navigation {
            return Err(ShiftSyncError::ProviderTimeout(60));
        }
        if self.current + 1 < self.pages.len() {
            self.current += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// In-memory remote store that records every call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: Mutex<Vec<RemoteEvent>>,
    calls: Mutex<Vec<String>>,
    failing_deletes: HashSet<String>,
    next_id: Mutex<usize>,
}

impl MemoryStore {
    pub fn with_events(events: Vec<RemoteEvent>) -> Self {
        MemoryStore {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    pub fn failing_delete(mut self, remote_id: &str) -> Self {
        self.failing_deletes.insert(remote_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<RemoteEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RemoteStore for MemoryStore {
    async fn list(&self, window: &SyncWindow, label: &str) -> ShiftSyncResult<Vec<RemoteEvent>> {
        self.calls.lock().unwrap().push("list".to_string());
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.label == label && window.contains(e.start.with_timezone(&Utc)))
            .cloned()
            .collect())
    }

    async fn insert(&self, shift: &Shift) -> ShiftSyncResult<RemoteEvent> {
        self.calls.lock().unwrap().push(format!("insert {shift}"));
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let event = RemoteEvent {
            remote_id: format!("mem-{}", *next_id),
            label: shift.label.clone(),
            start: shift.start.fixed_offset(),
            end: shift.end.fixed_offset(),
        };
        self.events.lock().unwrap().push(event.clone());
        Ok(event)
    }

    async fn delete(&self, remote_id: &str) -> ShiftSyncResult<()> {
        self.calls.lock().unwrap().push(format!("delete {remote_id}"));
        if self.failing_deletes.contains(remote_id) {
            return Err(ShiftSyncError::RemoteOperation(format!("delete {remote_id}: refused")));
        }
        self.events.lock().unwrap().retain(|e| e.remote_id != remote_id);
        Ok(())
    }
}

/// Notifier that keeps every batch of lines it was given.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Vec<String>>>,
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, lines: &[String]) -> ShiftSyncResult<()> {
        self.sent.lock().unwrap().push(lines.to_vec());
        Ok(())
    }
}
