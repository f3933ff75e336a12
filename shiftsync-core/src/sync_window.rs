//! The bounded slice of remote time a cycle may look at or touch.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::shift::Shift;

/// How far before the earliest parsed start the window opens.
pub const LOOKBACK: Duration = Duration::hours(24);
/// How far after the earliest parsed start the window closes.
pub const LOOKAHEAD: Duration = Duration::days(90);

/// Half-open `[from, to)` interval. An event belongs to the window when its
/// start does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl SyncWindow {
    pub fn starting_at(earliest: DateTime<Utc>) -> Self {
        SyncWindow {
            from: earliest - LOOKBACK,
            to: earliest + LOOKAHEAD,
        }
    }

    /// Window around the earliest start; `None` for an empty set.
    pub fn from_shifts(shifts: &[Shift]) -> Option<Self> {
        shifts
            .iter()
            .map(|s| s.start.with_timezone(&Utc))
            .min()
            .map(Self::starting_at)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.to
    }

    pub fn from_rfc3339(&self) -> String {
        self.from.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn to_rfc3339(&self) -> String {
        self.to.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn shift(d: u32, h: u32) -> Shift {
        Shift::new(
            New_York.with_ymd_and_hms(2025, 8, d, h, 0, 0).unwrap(),
            New_York.with_ymd_and_hms(2025, 8, d, h + 8, 0, 0).unwrap(),
            "Work",
        )
    }

    #[test]
    fn test_window_is_anchored_on_earliest_start() {
        let window = SyncWindow::from_shifts(&[shift(20, 6), shift(15, 10), shift(17, 7)]).unwrap();

        assert_eq!(window.from_rfc3339(), "2025-08-14T14:00:00Z");
        assert_eq!(window.to_rfc3339(), "2025-11-13T14:00:00Z");
    }

    #[test]
    fn test_empty_set_has_no_window() {
        assert!(SyncWindow::from_shifts(&[]).is_none());
    }

    #[test]
    fn test_bounds_are_half_open() {
        let window = SyncWindow::from_shifts(&[shift(15, 10)]).unwrap();

        assert!(window.contains(window.from));
        assert!(!window.contains(window.to));
        assert!(!window.contains(window.from - Duration::minutes(1)));
    }
}
