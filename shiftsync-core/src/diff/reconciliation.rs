//! Pure diff of parsed shifts against a remote snapshot.
//!
//! There is no update-in-place: a changed shift is a delete of the old
//! event plus an insert of the new one, and the date is reported as
//! updated.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::diff::ChangeKind;
use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::shift::{RemoteEvent, Shift, ShiftKey};
use crate::sync_window::SyncWindow;

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub window: SyncWindow,
    pub zone: Tz,
    /// Remote events with no matching parsed shift
    pub to_delete: Vec<RemoteEvent>,
    /// Parsed shifts with no matching remote event
    pub to_insert: Vec<Shift>,
    /// Extra remote events sharing a key with one that is kept
    pub duplicates: Vec<RemoteEvent>,
    /// Parsed shifts starting at or after the window end; left for a later cycle
    pub out_of_window: Vec<Shift>,
}

impl Reconciliation {
    /// Diff `parsed` (canonical, sorted) against the remote snapshot.
    ///
    /// Remote events with another label or starting outside `window` are
    /// ignored entirely, whatever the store returned.
    pub fn compute(
        parsed: &[Shift],
        remote: Vec<RemoteEvent>,
        window: SyncWindow,
        label: &str,
        zone: Tz,
    ) -> ShiftSyncResult<Self> {
        let mut remote_by_key: BTreeMap<ShiftKey, RemoteEvent> = BTreeMap::new();
        let mut duplicates = Vec::new();

        for event in remote {
            if event.label != label {
                log::debug!("ignoring remote {} labelled '{}'", event.remote_id, event.label);
                continue;
            }
            if !window.contains(event.start.with_timezone(&Utc)) {
                log::debug!("ignoring remote {} outside the sync window", event.remote_id);
                continue;
            }
            match remote_by_key.entry(event.key()) {
                Entry::Vacant(slot) => {
                    slot.insert(event);
                }
                Entry::Occupied(kept) => {
                    log::info!(
                        "remote {} duplicates {} at {}",
                        event.remote_id,
                        kept.get().remote_id,
                        kept.key()
                    );
                    duplicates.push(event);
                }
            }
        }

        let parsed_keys: BTreeSet<ShiftKey> = parsed.iter().map(Shift::key).collect();

        let to_delete: Vec<RemoteEvent> = remote_by_key
            .iter()
            .filter(|(key, _)| !parsed_keys.contains(key))
            .map(|(_, event)| event.clone())
            .collect();

        let mut to_insert = Vec::new();
        let mut out_of_window = Vec::new();
        for shift in parsed {
            if remote_by_key.contains_key(&shift.key()) {
                continue;
            }
            if window.contains(shift.start.with_timezone(&Utc)) {
                to_insert.push(shift.clone());
            } else {
                log::info!("{shift} starts after the sync window; deferring");
                out_of_window.push(shift.clone());
            }
        }

        let reconciliation = Reconciliation {
            window,
            zone,
            to_delete,
            to_insert,
            duplicates,
            out_of_window,
        };
        reconciliation.check_window()?;
        Ok(reconciliation)
    }

    /// No operation may leave the window. Failing here is a logic fault.
    fn check_window(&self) -> ShiftSyncResult<()> {
        let stray_remote = self
            .to_delete
            .iter()
            .chain(&self.duplicates)
            .find(|e| !self.window.contains(e.start.with_timezone(&Utc)))
            .map(|e| format!("delete of {}", e.remote_id));
        let stray_insert = self
            .to_insert
            .iter()
            .find(|s| !self.window.contains(s.start.with_timezone(&Utc)))
            .map(|s| format!("insert of {s}"));

        match stray_remote.or(stray_insert) {
            Some(op) => Err(ShiftSyncError::WindowViolation(op)),
            None => Ok(()),
        }
    }

    /// True when the remote store already matches the parsed set.
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_insert.is_empty() && self.duplicates.is_empty()
    }

    /// Per-date classification of the planned deletes and inserts.
    pub fn changes(&self) -> Vec<DateChange> {
        classify(&self.to_delete, &self.to_insert, &self.zone)
    }
}

/// One calendar date's change, with the time spans involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateChange {
    pub date: NaiveDate,
    pub kind: ChangeKind,
    /// Spans of removed events, `HH:MM–HH:MM` in the reference zone
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

impl DateChange {
    /// Notification line, e.g. `🔁 Updated shift on 2025-08-17: 07:00–16:00 → 07:00–17:00`.
    pub fn line(&self) -> String {
        let symbol = self.kind.symbol();
        let date = self.date.format("%Y-%m-%d");
        match self.kind {
            ChangeKind::Added => {
                format!("{symbol} New shift on {date}: {}", self.added.join(", "))
            }
            ChangeKind::Removed => {
                format!("{symbol} Removed shift on {date}: {}", self.removed.join(", "))
            }
            ChangeKind::Updated => format!(
                "{symbol} Updated shift on {date}: {} → {}",
                self.removed.join(", "),
                self.added.join(", ")
            ),
        }
    }
}

/// Group deletes and inserts by the reference-zone date of their start.
///
/// A date touched by both is `Updated`, by deletes only `Removed`, by
/// inserts only `Added`. Sorted by date.
pub fn classify(deleted: &[RemoteEvent], inserted: &[Shift], zone: &Tz) -> Vec<DateChange> {
    let mut by_date: BTreeMap<NaiveDate, (Vec<String>, Vec<String>)> = BTreeMap::new();

    for event in deleted {
        by_date
            .entry(event.date_in(zone))
            .or_default()
            .0
            .push(event.span_in(zone));
    }
    for shift in inserted {
        let start = shift.start.with_timezone(zone);
        let end = shift.end.with_timezone(zone);
        by_date
            .entry(start.date_naive())
            .or_default()
            .1
            .push(format!("{}–{}", start.format("%H:%M"), end.format("%H:%M")));
    }

    by_date
        .into_iter()
        .map(|(date, (removed, added))| {
            let kind = match (removed.is_empty(), added.is_empty()) {
                (false, false) => ChangeKind::Updated,
                (false, true) => ChangeKind::Removed,
                _ => ChangeKind::Added,
            };
            DateChange {
                date,
                kind,
                removed,
                added,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{remote, shift};
    use chrono_tz::America::New_York;

    fn reconcile(parsed: &[Shift], remote: Vec<RemoteEvent>) -> Reconciliation {
        let window = SyncWindow::from_shifts(parsed).unwrap();
        Reconciliation::compute(parsed, remote, window, "Work", New_York).unwrap()
    }

    #[test]
    fn test_scenario_a_matching_sets_need_nothing() {
        let parsed = vec![
            shift("2025-08-15", "10:00", "18:00"),
            shift("2025-08-17", "07:00", "16:00"),
        ];
        let remote = vec![
            remote("r1", "2025-08-15", "10:00", "18:00"),
            remote("r2", "2025-08-17", "07:00", "16:00"),
        ];

        let rec = reconcile(&parsed, remote);
        assert!(rec.is_empty());
        assert!(rec.changes().is_empty());
    }

    #[test]
    fn test_scenario_b_changed_end_is_an_update() {
        let parsed = vec![
            shift("2025-08-15", "10:00", "18:00"),
            shift("2025-08-17", "07:00", "17:00"),
        ];
        let remote = vec![
            remote("r1", "2025-08-15", "10:00", "18:00"),
            remote("r2", "2025-08-17", "07:00", "16:00"),
        ];

        let rec = reconcile(&parsed, remote);
        assert_eq!(rec.to_delete.len(), 1);
        assert_eq!(rec.to_delete[0].remote_id, "r2");
        assert_eq!(rec.to_insert, vec![shift("2025-08-17", "07:00", "17:00")]);

        let changes = rec.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Updated);
        assert_eq!(
            changes[0].line(),
            "🔁 Updated shift on 2025-08-17: 07:00–16:00 → 07:00–17:00"
        );
    }

    #[test]
    fn test_scenario_c_new_date_is_added() {
        let parsed = vec![
            shift("2025-08-15", "10:00", "18:00"),
            shift("2025-08-17", "07:00", "16:00"),
            shift("2025-08-20", "06:00", "15:00"),
        ];
        let remote = vec![
            remote("r1", "2025-08-15", "10:00", "18:00"),
            remote("r2", "2025-08-17", "07:00", "16:00"),
        ];

        let rec = reconcile(&parsed, remote);
        assert!(rec.to_delete.is_empty());
        assert_eq!(rec.to_insert, vec![shift("2025-08-20", "06:00", "15:00")]);

        let changes = rec.changes();
        assert_eq!(changes[0].kind, ChangeKind::Added);
        assert_eq!(changes[0].line(), "➕ New shift on 2025-08-20: 06:00–15:00");
    }

    #[test]
    fn test_scenario_d_missing_date_is_removed() {
        let parsed = vec![shift("2025-08-15", "10:00", "18:00")];
        let remote = vec![
            remote("r1", "2025-08-15", "10:00", "18:00"),
            remote("r3", "2025-08-21", "09:00", "17:00"),
        ];

        let rec = reconcile(&parsed, remote);
        assert_eq!(rec.to_delete.len(), 1);
        assert_eq!(rec.to_delete[0].remote_id, "r3");
        assert!(rec.to_insert.is_empty());

        let changes = rec.changes();
        assert_eq!(changes[0].kind, ChangeKind::Removed);
        assert_eq!(changes[0].line(), "❌ Removed shift on 2025-08-21: 09:00–17:00");
    }

    #[test]
    fn test_remote_outside_window_is_never_deleted() {
        let parsed = vec![shift("2025-08-15", "10:00", "18:00")];
        let remote = vec![
            remote("history", "2025-08-10", "10:00", "18:00"),
            remote("far", "2025-12-01", "10:00", "18:00"),
            remote("edge", "2025-08-14", "09:00", "17:00"),
        ];

        let rec = reconcile(&parsed, remote);
        assert!(rec.to_delete.is_empty());
        assert_eq!(rec.to_insert.len(), 1);
    }

    #[test]
    fn test_other_labels_are_ignored() {
        let parsed = vec![shift("2025-08-15", "10:00", "18:00")];
        let mut dentist = remote("dentist", "2025-08-16", "09:00", "10:00");
        dentist.label = "Dentist".to_string();

        let rec = reconcile(&parsed, vec![dentist]);
        assert!(rec.to_delete.is_empty());
    }

    #[test]
    fn test_remote_duplicates_keep_one() {
        let parsed = vec![shift("2025-08-15", "10:00", "18:00")];
        let remote = vec![
            remote("r1", "2025-08-15", "10:00", "18:00"),
            remote("r1-copy", "2025-08-15", "10:00", "18:00"),
        ];

        let rec = reconcile(&parsed, remote);
        assert!(rec.to_delete.is_empty());
        assert!(rec.to_insert.is_empty());
        assert_eq!(rec.duplicates.len(), 1);
        assert_eq!(rec.duplicates[0].remote_id, "r1-copy");
        assert!(rec.changes().is_empty());
        assert!(!rec.is_empty());
    }

    #[test]
    fn test_shifts_past_the_window_are_deferred() {
        let parsed = vec![
            shift("2025-08-15", "10:00", "18:00"),
            shift("2025-11-20", "10:00", "18:00"),
        ];

        let rec = reconcile(&parsed, vec![]);
        assert_eq!(rec.to_insert.len(), 1);
        assert_eq!(rec.out_of_window, vec![shift("2025-11-20", "10:00", "18:00")]);
    }

    #[test]
    fn test_overnight_shift_is_classified_by_start_date() {
        let inserted = vec![shift("2025-08-17", "23:00", "07:00")];
        let changes = classify(&[], &inserted, &New_York);

        assert_eq!(changes[0].date.to_string(), "2025-08-17");
        assert_eq!(changes[0].added, vec!["23:00–07:00".to_string()]);
    }

    #[test]
    fn test_compare_in_utc_across_offsets() {
        let parsed = vec![shift("2025-08-15", "10:00", "18:00")];
        let mut utc_copy = remote("r1", "2025-08-15", "10:00", "18:00");
        utc_copy.start = chrono::DateTime::parse_from_rfc3339("2025-08-15T14:00:00Z").unwrap();
        utc_copy.end = chrono::DateTime::parse_from_rfc3339("2025-08-15T22:00:30Z").unwrap();

        let rec = reconcile(&parsed, vec![utc_copy]);
        assert!(rec.is_empty());
    }
}
