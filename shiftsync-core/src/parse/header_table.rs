//! Header-mapped table strategy.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::column_map::{ColumnDateMap, column_date_map, header_cells, section_rows, tables};
use super::{GridStrategy, Page, ParseContext};
use crate::page::{is_hidden, selector, visible_text};
use crate::shift::{ParsedCandidate, Source};
use crate::time_range::{find_time_ranges, first_time_range};

/// Sub-elements calendar widgets use for an event's time label.
static TIME_BADGES: LazyLock<Selector> =
    LazyLock::new(|| selector("span.fc-time, .fc-time, div.time, span.time"));

/// Walks each table's body rows column by column, dating each cell through
/// that table's own [`ColumnDateMap`].
pub struct HeaderTableStrategy;

impl GridStrategy for HeaderTableStrategy {
    fn name(&self) -> &'static str {
        "header-table"
    }

    fn parse(&self, page: &Page<'_>, cx: &ParseContext) -> Vec<ParsedCandidate> {
        let tables = tables(page.snapshot);
        // The live map describes the page's only grid; with several tables
        // it cannot say which one it belongs to.
        let live = if tables.len() == 1 { page.live_columns } else { None };

        let mut candidates = Vec::new();

        for table in tables {
            let columns = column_date_map(page.snapshot, table, live);
            if columns.is_empty() {
                continue;
            }
            for row in section_rows(table, "tbody") {
                parse_row(row, &columns, cx, &mut candidates);
            }
        }

        candidates
    }
}

fn parse_row(
    row: ElementRef<'_>,
    columns: &ColumnDateMap,
    cx: &ParseContext,
    out: &mut Vec<ParsedCandidate>,
) {
    if is_hidden(row) {
        return;
    }
    for (col, cell) in header_cells(row).into_iter().enumerate() {
        let Some(date) = columns.get(col) else {
            continue;
        };
        if is_hidden(cell) {
            continue;
        }

        let badges: Vec<ElementRef<'_>> = cell
            .select(&TIME_BADGES)
            .filter(|badge| !is_hidden(*badge))
            .collect();

        if badges.is_empty() {
            let text = visible_text(cell);
            out.extend(
                find_time_ranges(&text).filter_map(|range| cx.candidate(date, &range, Source::Grid)),
            );
        } else {
            for badge in badges {
                let text = visible_text(badge);
                if let Some(range) = first_time_range(&text) {
                    out.extend(cx.candidate(date, &range, Source::Grid));
                }
            }
        }
    }
}
