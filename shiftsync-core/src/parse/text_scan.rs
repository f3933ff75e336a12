//! Constrained text scan, the last grid strategy.
//!
//! Any visible text containing a time range is a candidate, but only when an
//! explicit date marker sits on one of its nearest ancestors. Unrelated page
//! text (banners, legends, footers) never gets a date and is dropped.

use scraper::ElementRef;

use super::{GridStrategy, Page, ParseContext};
use crate::error::ShiftSyncError;
use crate::page::explicit_date;
use crate::shift::{ParsedCandidate, Source};
use crate::time_range::{contains_time_range, find_time_ranges};

/// How many elements above a text node are searched for a date.
pub const MAX_ANCESTOR_LEVELS: usize = 6;

pub struct TextScanStrategy;

impl GridStrategy for TextScanStrategy {
    fn name(&self) -> &'static str {
        "text-scan"
    }

    fn parse(&self, page: &Page<'_>, cx: &ParseContext) -> Vec<ParsedCandidate> {
        let mut candidates = Vec::new();

        for (parent, text) in page.snapshot.visible_text_nodes() {
            if !contains_time_range(text) {
                continue;
            }

            let Some(date) = nearest_date(parent) else {
                let err = ShiftSyncError::UnresolvedDate(text.trim().to_string());
                log::debug!("page {}: {}", cx.page, err);
                continue;
            };

            candidates.extend(
                find_time_ranges(text).filter_map(|range| cx.candidate(date, &range, Source::Grid)),
            );
        }

        candidates
    }
}

fn nearest_date(start: ElementRef<'_>) -> Option<chrono::NaiveDate> {
    std::iter::once(start)
        .chain(start.ancestors().filter_map(ElementRef::wrap))
        .take(MAX_ANCESTOR_LEVELS)
        .find_map(|el| explicit_date(&el))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageSnapshot;
    use chrono::NaiveDate;
    use chrono_tz::America::New_York;

    fn run(markup: &str) -> Vec<ParsedCandidate> {
        let snapshot = PageSnapshot::parse(markup);
        let page = Page {
            snapshot: &snapshot,
            live_columns: None,
        };
        TextScanStrategy.parse(&page, &ParseContext::new(New_York, "Work", 1))
    }

    #[test]
    fn test_dates_text_from_nearby_ancestor() {
        let found = run(
            r#"<section data-date="2025-08-17">
                 <ul><li><p><b>11:00 pm - 7:00 am</b></p></li></ul>
               </section>"#,
        );

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].shift.date(), NaiveDate::from_ymd_opt(2025, 8, 17).unwrap());
        assert_eq!(found[0].shift.end.date_naive(), NaiveDate::from_ymd_opt(2025, 8, 18).unwrap());
    }

    #[test]
    fn test_text_without_nearby_date_is_dropped() {
        let found = run(
            r#"<p>Store hours 8:00 am - 10:00 pm</p>
               <div data-date="2025-08-17">
                 <div><div><div><div><div><div><span>9:00 am - 5:00 pm</span></div></div></div></div></div></div>
               </div>"#,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_hidden_text_is_ignored() {
        let found = run(
            r#"<div data-date="2025-08-17"><span style="visibility:hidden">9:00 am - 5:00 pm</span></div>"#,
        );
        assert!(found.is_empty());
    }
}
