//! Rendering collaborator.
//!
//! Browser automation lives outside this crate. The core only needs a page
//! snapshot, an optional live column map, day selection with panel text,
//! and period navigation. Any of them may come back empty without that
//! being an error.

mod process;

pub use process::RendererProcess;

use crate::error::ShiftSyncResult;
use crate::parse::{DayCell, LiveColumnMap};

#[allow(async_fn_in_trait)]
pub trait Renderer {
    /// Return to the first schedule period before a crawl attempt.
    async fn reset(&mut self) -> ShiftSyncResult<()>;

    /// Serialized markup of the current page.
    async fn snapshot(&mut self) -> ShiftSyncResult<Option<String>>;

    /// Column index to ISO date read from the live page, when available.
    async fn column_dates(&mut self) -> ShiftSyncResult<Option<LiveColumnMap>>;

    /// Focus a day cell so its detail panel shows; `false` if it could not.
    async fn select_day(&mut self, cell: &DayCell) -> ShiftSyncResult<bool>;

    /// Text of the currently visible detail panel.
    async fn panel_text(&mut self) -> ShiftSyncResult<Option<String>>;

    /// Advance one period; `false` when the visible period did not change.
    async fn next_period(&mut self) -> ShiftSyncResult<bool>;
}
