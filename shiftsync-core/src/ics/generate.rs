//! ICS generation.
//!
//! Output depends only on the shift set: UIDs and DTSTAMP are derived from
//! each shift's key, and events are written in `(start, end)` order.

use std::collections::BTreeMap;

use icalendar::{Calendar, Component, EventLike};

use crate::shift::{Shift, ShiftKey};

const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// One VEVENT per distinct `(start, end)`, sorted by start.
pub fn generate_schedule_ics(shifts: &[Shift]) -> String {
    let by_key: BTreeMap<ShiftKey, &Shift> = shifts.iter().map(|s| (s.key(), s)).rev().collect();

    let mut cal = Calendar::new();
    for (key, shift) in by_key {
        let start = key.start.format(UTC_FORMAT).to_string();
        let end = key.end.format(UTC_FORMAT).to_string();

        let mut event = icalendar::Event::new();
        event.uid(&format!("{start}-{end}@shiftsync"));
        event.summary(&shift.label);
        event.add_property("DTSTAMP", &start);
        event.add_property("DTSTART", &start);
        event.add_property("DTEND", &end);
        cal.push(event.done());
    }

    strip_ics_bloat(&cal.done().to_string())
}

/// Pin PRODID and drop CALSCALE:GREGORIAN, which is the default.
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:SHIFTSYNC\r\n");
            continue;
        }
        if line == "CALSCALE:GREGORIAN" {
            continue;
        }
        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::shift;

    #[test]
    fn test_events_are_sorted_and_unique() {
        let shifts = vec![
            shift("2025-08-17", "07:00", "16:00"),
            shift("2025-08-15", "10:00", "18:00"),
            shift("2025-08-17", "07:00", "16:00"),
        ];
        let ics = generate_schedule_ics(&shifts);

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        let first = ics.find("DTSTART:20250815T140000Z").unwrap();
        let second = ics.find("DTSTART:20250817T110000Z").unwrap();
        assert!(first < second);
        assert!(ics.contains("DTEND:20250815T220000Z"));
        assert!(ics.contains("SUMMARY:Work"));
        assert!(ics.contains("PRODID:SHIFTSYNC"));
        assert!(!ics.contains("CALSCALE"));
    }

    #[test]
    fn test_output_is_reproducible() {
        let a = vec![
            shift("2025-08-15", "10:00", "18:00"),
            shift("2025-08-17", "23:00", "07:00"),
        ];
        let b: Vec<Shift> = a.iter().rev().cloned().collect();

        assert_eq!(generate_schedule_ics(&a), generate_schedule_ics(&b));
        assert!(generate_schedule_ics(&a).contains("UID:20250818T030000Z-20250818T110000Z@shiftsync"));
    }

    #[test]
    fn test_empty_set_is_an_empty_calendar() {
        let ics = generate_schedule_ics(&[]);
        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert!(!ics.contains("VEVENT"));
    }
}
