//! Shift types.
//!
//! A `Shift` is the canonical unit produced by the parsers and consumed by
//! the reconciler. Identity is the `(start, end)` pair in UTC at minute
//! resolution (`ShiftKey`), never the wall-clock text it was parsed from.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Identity of a shift or remote event for deduplication and reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShiftKey {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ShiftKey {
    pub fn new<A: TimeZone, B: TimeZone>(start: &DateTime<A>, end: &DateTime<B>) -> Self {
        ShiftKey {
            start: truncate_to_minute(start.with_timezone(&Utc)),
            end: truncate_to_minute(end.with_timezone(&Utc)),
        }
    }
}

impl fmt::Display for ShiftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format("%Y-%m-%dT%H:%MZ"),
            self.end.format("%Y-%m-%dT%H:%MZ")
        )
    }
}

/// Drop seconds and sub-second components.
pub fn truncate_to_minute(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

/// A work interval in the reference zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub label: String,
}

impl Shift {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>, label: impl Into<String>) -> Self {
        Shift {
            start,
            end,
            label: label.into(),
        }
    }

    pub fn key(&self) -> ShiftKey {
        ShiftKey::new(&self.start, &self.end)
    }

    /// Calendar date of the start in the reference zone.
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// `HH:MM–HH:MM` in the reference zone.
    pub fn span(&self) -> String {
        format_span(&self.start, &self.end)
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date(), self.span(), self.label)
    }
}

/// Which parser produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Grid,
    DetailPanel,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Grid => write!(f, "grid"),
            Source::DetailPanel => write!(f, "detail-panel"),
        }
    }
}

/// A shift with provenance, only alive until deduplication.
#[derive(Debug, Clone)]
pub struct ParsedCandidate {
    pub shift: Shift,
    pub source: Source,
    /// 1-based page/period ordinal within the crawl
    pub page: usize,
}

/// A shift as currently materialized in the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// Opaque identifier owned by the remote store
    pub remote_id: String,
    pub label: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl RemoteEvent {
    pub fn key(&self) -> ShiftKey {
        ShiftKey::new(&self.start, &self.end)
    }

    /// Calendar date of the start, seen from the reference zone.
    pub fn date_in(&self, zone: &Tz) -> NaiveDate {
        self.start.with_timezone(zone).date_naive()
    }

    pub fn span_in(&self, zone: &Tz) -> String {
        format_span(&self.start.with_timezone(zone), &self.end.with_timezone(zone))
    }
}

fn format_span<Z: TimeZone>(start: &DateTime<Z>, end: &DateTime<Z>) -> String
where
    Z::Offset: fmt::Display,
{
    format!("{}–{}", start.format("%H:%M"), end.format("%H:%M"))
}
