//! Schedule extraction.
//!
//! The grid parser is an ordered chain of [`GridStrategy`] implementations;
//! the first one that yields any candidate wins. When the whole chain comes
//! up empty the caller falls back to the [`DetailPanelParser`], which needs
//! the live renderer rather than a static snapshot.

mod column_map;
mod day_container;
mod detail_panel;
mod header_table;
mod text_scan;

pub use column_map::{ColumnDateMap, LiveColumnMap, column_date_map};
pub use day_container::DayContainerStrategy;
pub use detail_panel::{DayCell, DetailPanelParser, day_cells};
pub use header_table::HeaderTableStrategy;
pub use text_scan::{MAX_ANCESTOR_LEVELS, TextScanStrategy};

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::page::PageSnapshot;
use crate::shift::{ParsedCandidate, Source};
use crate::time_range::{TimeRangeMatch, shift_from_match};

/// Settings shared by every strategy for one page.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub zone: Tz,
    pub label: String,
    /// 1-based page/period ordinal
    pub page: usize,
}

impl ParseContext {
    pub fn new(zone: Tz, label: impl Into<String>, page: usize) -> Self {
        ParseContext {
            zone,
            label: label.into(),
            page,
        }
    }

    /// Resolve a matched range on `date`; malformed ranges are logged and dropped.
    pub fn candidate(
        &self,
        date: NaiveDate,
        range: &TimeRangeMatch<'_>,
        source: Source,
    ) -> Option<ParsedCandidate> {
        match shift_from_match(date, range, self.zone, &self.label) {
            Ok(shift) => Some(ParsedCandidate {
                shift,
                source,
                page: self.page,
            }),
            Err(e) => {
                log::debug!("page {}: dropping '{}' on {}: {}", self.page, range, date, e);
                None
            }
        }
    }
}

/// One rendered page as the grid strategies see it.
pub struct Page<'a> {
    pub snapshot: &'a PageSnapshot,
    /// Column index to ISO date, read from the live DOM by the renderer
    pub live_columns: Option<&'a LiveColumnMap>,
}

/// A self-contained way of reading shifts out of a page snapshot.
pub trait GridStrategy {
    fn name(&self) -> &'static str;
    fn parse(&self, page: &Page<'_>, cx: &ParseContext) -> Vec<ParsedCandidate>;
}

/// Result of running the grid chain on one page.
pub struct GridOutcome {
    /// Name of the strategy that produced the candidates
    pub strategy: &'static str,
    pub candidates: Vec<ParsedCandidate>,
}

pub struct GridParser {
    strategies: Vec<Box<dyn GridStrategy>>,
}

impl Default for GridParser {
    fn default() -> Self {
        GridParser::new(vec![
            Box::new(HeaderTableStrategy),
            Box::new(DayContainerStrategy),
            Box::new(TextScanStrategy),
        ])
    }
}

impl GridParser {
    pub fn new(strategies: Vec<Box<dyn GridStrategy>>) -> Self {
        GridParser { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain; `EmptyParseResult` when no strategy finds anything.
    pub fn parse(&self, page: &Page<'_>, cx: &ParseContext) -> ShiftSyncResult<GridOutcome> {
        for strategy in &self.strategies {
            let candidates = strategy.parse(page, cx);
            if !candidates.is_empty() {
                log::debug!(
                    "page {}: {} strategy found {} candidate(s)",
                    cx.page,
                    strategy.name(),
                    candidates.len()
                );
                return Ok(GridOutcome {
                    strategy: strategy.name(),
                    candidates,
                });
            }
            log::debug!("page {}: {} strategy found nothing", cx.page, strategy.name());
        }

        Err(ShiftSyncError::EmptyParseResult { page: cx.page })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    struct Fixed(&'static str, usize);

    impl GridStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn parse(&self, _page: &Page<'_>, cx: &ParseContext) -> Vec<ParsedCandidate> {
            let date = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
            let range = TimeRangeMatch {
                start: "10:00 am",
                end: "6:00 pm",
            };
            (0..self.1)
                .filter_map(|_| cx.candidate(date, &range, Source::Grid))
                .collect()
        }
    }

    #[test]
    fn test_first_non_empty_strategy_wins() {
        let parser = GridParser::new(vec![
            Box::new(Fixed("empty", 0)),
            Box::new(Fixed("second", 2)),
            Box::new(Fixed("third", 5)),
        ]);
        let snapshot = PageSnapshot::parse("<html></html>");
        let page = Page {
            snapshot: &snapshot,
            live_columns: None,
        };
        let cx = ParseContext::new(New_York, "Work", 1);

        let outcome = parser.parse(&page, &cx).unwrap();
        assert_eq!(outcome.strategy, "second");
        assert_eq!(outcome.candidates.len(), 2);
    }

    #[test]
    fn test_exhausted_chain_reports_empty_page() {
        let parser = GridParser::new(vec![Box::new(Fixed("empty", 0))]);
        let snapshot = PageSnapshot::parse("<html></html>");
        let page = Page {
            snapshot: &snapshot,
            live_columns: None,
        };
        let cx = ParseContext::new(New_York, "Work", 2);

        assert!(matches!(
            parser.parse(&page, &cx),
            Err(ShiftSyncError::EmptyParseResult { page: 2 })
        ));
    }

    #[test]
    fn test_malformed_range_is_dropped() {
        let cx = ParseContext::new(New_York, "Work", 1);
        let date = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
        let bad = TimeRangeMatch {
            start: "14:00 pm",
            end: "6:00 pm",
        };
        assert!(cx.candidate(date, &bad, Source::Grid).is_none());
    }

    #[test]
    fn test_default_chain_order() {
        assert_eq!(
            GridParser::default().strategy_names(),
            vec!["header-table", "day-container", "text-scan"]
        );
    }
}
