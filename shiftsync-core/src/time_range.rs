//! Time normalizer.
//!
//! Turns a calendar date plus two 12-hour time strings (`7:00 am`, `3p`,
//! `11:30 P.M.`) into zoned instants. An end at or before the start is an
//! overnight shift and lands on the following day.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::shift::Shift;

/// One clock time with a meridiem marker: `7:00 am`, `7am`, `7 a.m.`, `3p`
const CLOCK: &str = r"\d{1,2}(?::\d{2})?\s*[ap](?:\.\s?m\.?|\.|m\b|\b)";

static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({CLOCK})\s*(?:-|–|—|to)\s*({CLOCK})"))
        .expect("time range pattern is valid")
});

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2})(?::(\d{2}))?\s*([ap])(?:\.\s?m\.?|\.|m)?\s*$")
        .expect("time of day pattern is valid")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("iso date pattern is valid"));

static EMBEDDED_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("iso date pattern is valid"));

/// A `start - end` pair found in free text, still unparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRangeMatch<'a> {
    pub start: &'a str,
    pub end: &'a str,
}

impl std::fmt::Display for TimeRangeMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Every time range in `text`, left to right.
pub fn find_time_ranges(text: &str) -> impl Iterator<Item = TimeRangeMatch<'_>> {
    TIME_RANGE.captures_iter(text).filter_map(|caps| {
        Some(TimeRangeMatch {
            start: caps.get(1)?.as_str(),
            end: caps.get(2)?.as_str(),
        })
    })
}

pub fn first_time_range(text: &str) -> Option<TimeRangeMatch<'_>> {
    find_time_ranges(text).next()
}

pub fn contains_time_range(text: &str) -> bool {
    TIME_RANGE.is_match(text)
}

/// Parse a single 12-hour clock time.
pub fn parse_time_of_day(s: &str) -> ShiftSyncResult<NaiveTime> {
    let malformed = || ShiftSyncError::MalformedTimeRange(s.trim().to_string());

    let caps = TIME_OF_DAY.captures(s).ok_or_else(malformed)?;
    let hour: u32 = caps[1].parse().map_err(|_| malformed())?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().map_err(|_| malformed())?,
        None => 0,
    };

    if !(1..=12).contains(&hour) {
        return Err(malformed());
    }

    let pm = caps[3].eq_ignore_ascii_case("p");
    let hour24 = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };

    NaiveTime::from_hms_opt(hour24, minute, 0).ok_or_else(malformed)
}

/// Strict `YYYY-MM-DD`.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if !ISO_DATE.is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// First `YYYY-MM-DD` embedded in a longer string such as an aria-label.
pub fn find_iso_date(s: &str) -> Option<NaiveDate> {
    EMBEDDED_ISO_DATE
        .captures_iter(s)
        .find_map(|caps| parse_iso_date(&caps[1]))
}

/// Resolve a date and two clock strings to zoned instants with `end > start`.
pub fn normalize(
    date: NaiveDate,
    start: &str,
    end: &str,
    zone: Tz,
) -> ShiftSyncResult<(DateTime<Tz>, DateTime<Tz>)> {
    let start_time = parse_time_of_day(start)?;
    let end_time = parse_time_of_day(end)?;

    let start_dt = localize(date.and_time(start_time), zone)?;
    let mut end_dt = localize(date.and_time(end_time), zone)?;

    if end_dt <= start_dt {
        let next_day = date
            .succ_opt()
            .ok_or_else(|| ShiftSyncError::MalformedTimeRange(format!("{start} - {end}")))?;
        end_dt = localize(next_day.and_time(end_time), zone)?;
    }

    Ok((start_dt, end_dt))
}

/// Build a labelled shift from a date and a matched range.
pub fn shift_from_match(
    date: NaiveDate,
    range: &TimeRangeMatch<'_>,
    zone: Tz,
    label: &str,
) -> ShiftSyncResult<Shift> {
    let (start, end) = normalize(date, range.start, range.end, zone)?;
    Ok(Shift::new(start, end, label))
}

fn localize(naive: NaiveDateTime, zone: Tz) -> ShiftSyncResult<DateTime<Tz>> {
    zone.from_local_datetime(&naive).earliest().ok_or_else(|| {
        ShiftSyncError::MalformedTimeRange(format!("{naive} does not exist in {zone}"))
    })
}
