//! Day-container strategy: every day cell carries its own date.

use std::sync::LazyLock;

use scraper::Selector;

use super::{GridStrategy, Page, ParseContext};
use crate::page::{explicit_date, is_hidden, selector, visible_text};
use crate::shift::{ParsedCandidate, Source};
use crate::time_range::first_time_range;

static DAY_CONTAINERS: LazyLock<Selector> = LazyLock::new(|| {
    selector(
        "div.fc-daygrid-day, div.fc-day, div.fc-daygrid-day-frame, td.fc-daygrid-day, [role='gridcell']",
    )
});

static EVENTS: LazyLock<Selector> =
    LazyLock::new(|| selector(".fc-event, .fc-daygrid-event, .fc-list-item, .event"));

pub struct DayContainerStrategy;

impl GridStrategy for DayContainerStrategy {
    fn name(&self) -> &'static str {
        "day-container"
    }

    fn parse(&self, page: &Page<'_>, cx: &ParseContext) -> Vec<ParsedCandidate> {
        let mut candidates = Vec::new();

        for day in page.snapshot.select_visible(&DAY_CONTAINERS) {
            let Some(date) = explicit_date(&day) else {
                continue;
            };

            for event in day.select(&EVENTS).filter(|ev| !is_hidden(*ev)) {
                let text = visible_text(event);
                if let Some(range) = first_time_range(&text) {
                    candidates.extend(cx.candidate(date, &range, Source::Grid));
                }
            }
        }

        candidates
    }
}
