//! Column index to calendar date mapping for table-shaped calendars.
//!
//! Built fresh for every page and thrown away once that page is parsed.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::page::{PageSnapshot, data_date, is_hidden, selector, visible_text};
use crate::time_range::parse_iso_date;

/// Column index (0-based) to raw ISO date, as reported by the renderer.
pub type LiveColumnMap = BTreeMap<usize, String>;

static TABLES: LazyLock<Selector> = LazyLock::new(|| selector("table"));

static MONTH_HEADING: LazyLock<Selector> = LazyLock::new(|| {
    selector(
        "span.toolbar-text.element-title, .fc-toolbar-title, .fc-toolbar h2, .fc-toolbar .fc-center h2",
    )
});

static MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z]{3,9})\.?\s+(\d{4})").expect("month heading pattern is valid")
});

static DAY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}$").expect("day number pattern is valid"));

/// Classes calendar widgets put on cells that belong to a neighbouring month.
const ADJACENT_MONTH_CLASSES: &[&str] = &[
    "fc-other-month",
    "fc-day-other",
    "other-month",
    "adjacent-month",
    "fc-day-disabled",
];

/// Resolved column positions for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDateMap(BTreeMap<usize, NaiveDate>);

impl ColumnDateMap {
    pub fn get(&self, column: usize) -> Option<NaiveDate> {
        self.0.get(&column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, NaiveDate)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Build the column map for one table of a page.
///
/// A live map with at least one valid ISO date wins outright. Otherwise the
/// table's own header row is read: explicit `data-date` cells map directly,
/// and bare day-number cells are dated against the displayed month heading
/// unless they may belong to an adjacent month, in which case they are
/// dropped.
pub fn column_date_map(
    snapshot: &PageSnapshot,
    table: ElementRef<'_>,
    live: Option<&LiveColumnMap>,
) -> ColumnDateMap {
    if let Some(live) = live {
        let resolved: BTreeMap<usize, NaiveDate> = live
            .iter()
            .filter_map(|(col, iso)| parse_iso_date(iso).map(|d| (*col, d)))
            .collect();
        if !resolved.is_empty() {
            return ColumnDateMap(resolved);
        }
    }

    let Some(header) = section_rows(table, "thead").into_iter().next() else {
        return ColumnDateMap::default();
    };

    let mut map = BTreeMap::new();
    let mut day_numbers: Vec<(usize, u32, bool)> = Vec::new();

    for (col, cell) in header_cells(header).into_iter().enumerate() {
        if is_hidden(cell) {
            continue;
        }
        if let Some(date) = data_date(&cell) {
            map.insert(col, date);
            continue;
        }
        let text = visible_text(cell);
        if DAY_NUMBER.is_match(&text) {
            if let Ok(day) = text.parse::<u32>() {
                day_numbers.push((col, day, is_adjacent_month(&cell)));
            }
        }
    }

    if !day_numbers.is_empty() {
        match displayed_month(snapshot) {
            Some(month) => resolve_day_numbers(month, &day_numbers, &mut map),
            None => log::debug!("header has day numbers but no month heading"),
        }
    }

    ColumnDateMap(map)
}

/// Visible tables of a page, outermost first.
pub(crate) fn tables(snapshot: &PageSnapshot) -> Vec<ElementRef<'_>> {
    snapshot.select_visible(&TABLES).collect()
}

/// `tr` rows of the table's own `thead` or `tbody` sections; rows of
/// nested tables are not included.
pub(crate) fn section_rows<'a>(table: ElementRef<'a>, section: &str) -> Vec<ElementRef<'a>> {
    table
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == section)
        .flat_map(|sec| {
            sec.children()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "tr")
        })
        .collect()
}

/// Direct `td`/`th` children of a header row.
pub(crate) fn header_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

fn is_adjacent_month(cell: &ElementRef<'_>) -> bool {
    let value = cell.value();
    value
        .classes()
        .any(|class| ADJACENT_MONTH_CLASSES.contains(&class))
        || value
            .attr("aria-disabled")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// First day of the month named in the toolbar heading (`August 2025`).
fn displayed_month(snapshot: &PageSnapshot) -> Option<NaiveDate> {
    snapshot
        .select_visible(&MONTH_HEADING)
        .map(visible_text)
        .find_map(|heading| {
            let caps = MONTH_YEAR.captures(&heading)?;
            NaiveDate::parse_from_str(&format!("1 {} {}", &caps[1], &caps[2]), "%d %B %Y").ok()
        })
}

/// Date bare day numbers against `month`.
///
/// Numbers that do not strictly increase across the row mean the row spans
/// a month boundary; without an explicit date there is no telling which
/// side the heading refers to, so the whole row is left unresolved.
fn resolve_day_numbers(
    month: NaiveDate,
    day_numbers: &[(usize, u32, bool)],
    map: &mut BTreeMap<usize, NaiveDate>,
) {
    let increasing = day_numbers.windows(2).all(|pair| pair[0].1 < pair[1].1);
    if !increasing {
        log::debug!(
            "header day numbers wrap a month boundary; leaving {} column(s) unresolved",
            day_numbers.len()
        );
        return;
    }

    for &(col, day, adjacent) in day_numbers {
        if adjacent {
            log::debug!("column {col}: day {day} belongs to an adjacent month; skipped");
            continue;
        }
        match NaiveDate::from_ymd_opt(month.year(), month.month(), day) {
            Some(date) => {
                map.insert(col, date);
            }
            None => log::debug!("column {col}: day {day} is not in {}", month.format("%B %Y")),
        }
    }
}
