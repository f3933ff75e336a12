//! Detail-panel fallback.
//!
//! Used for a page when the grid chain finds nothing: each dated day cell
//! is selected through the renderer and whatever the detail panel shows
//! is scanned for time ranges.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use super::ParseContext;
use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::page::{PageSnapshot, data_date, selector};
use crate::render::Renderer;
use crate::shift::{ParsedCandidate, Source};
use crate::time_range::find_time_ranges;

static TABLE_DAY_CELLS: LazyLock<Selector> = LazyLock::new(|| selector("td[data-date]"));

static DIV_DAY_CELLS: LazyLock<Selector> =
    LazyLock::new(|| selector("div.fc-daygrid-day[data-date], div[data-date]"));

/// A day cell the renderer can select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    /// Position among the page's dated cells, in document order
    pub ordinal: usize,
}

/// Dated, visible day cells of a page; table cells are preferred when present.
pub fn day_cells(snapshot: &PageSnapshot) -> Vec<DayCell> {
    let mut dated: Vec<NaiveDate> = snapshot
        .select_visible(&TABLE_DAY_CELLS)
        .filter_map(|el| data_date(&el))
        .collect();

    if dated.is_empty() {
        dated = snapshot
            .select_visible(&DIV_DAY_CELLS)
            .filter_map(|el| data_date(&el))
            .collect();
    }

    let mut seen = HashSet::new();
    dated.retain(|date| seen.insert(*date));

    dated
        .into_iter()
        .enumerate()
        .map(|(ordinal, date)| DayCell { date, ordinal })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct DetailPanelParser {
    /// Upper bound on cells selected per page
    pub max_cells: Option<usize>,
}

impl DetailPanelParser {
    pub fn new(max_cells: Option<usize>) -> Self {
        DetailPanelParser { max_cells }
    }

    /// Select each dated cell and read the panel.
    ///
    /// A cell that cannot be selected, shows no panel, or shows unparseable
    /// text contributes nothing; only an entirely empty page is an error.
    pub async fn parse<R: Renderer>(
        &self,
        renderer: &mut R,
        snapshot: &PageSnapshot,
        cx: &ParseContext,
    ) -> ShiftSyncResult<Vec<ParsedCandidate>> {
        let cells = day_cells(snapshot);
        let limit = self.max_cells.unwrap_or(cells.len());
        let mut candidates = Vec::new();

        for cell in cells.iter().take(limit) {
            match renderer.select_day(cell).await {
                Ok(true) => {}
                Ok(false) => {
                    log::debug!("page {}: could not select {}", cx.page, cell.date);
                    continue;
                }
                Err(e) => {
                    log::debug!("page {}: selecting {} failed: {}", cx.page, cell.date, e);
                    continue;
                }
            }

            let text = match renderer.panel_text().await {
                Ok(Some(text)) if !text.trim().is_empty() => text,
                Ok(_) => {
                    log::debug!("page {}: no panel for {}", cx.page, cell.date);
                    continue;
                }
                Err(e) => {
                    log::debug!("page {}: reading panel for {} failed: {}", cx.page, cell.date, e);
                    continue;
                }
            };

            candidates.extend(
                find_time_ranges(&text)
                    .filter_map(|range| cx.candidate(cell.date, &range, Source::DetailPanel)),
            );
        }

        if candidates.is_empty() {
            return Err(ShiftSyncError::EmptyParseResult { page: cx.page });
        }

        Ok(candidates)
    }
}
