//! Shift extraction and calendar reconciliation.
//!
//! This crate turns rendered schedule pages into a canonical set of shifts
//! and reconciles that set against a remote calendar:
//! - `parse` for the grid strategies and the detail-panel fallback
//! - `diff` for the window-bounded reconciliation and its notifications
//! - `cycle` for the single entry point tying both to the collaborators

pub mod config;
pub mod cycle;
pub mod diff;
pub mod error;
pub mod exports;
pub mod ics;
pub mod merge;
pub mod notify;
pub mod page;
pub mod parse;
pub mod protocol;
pub mod remote;
pub mod render;
pub mod shift;
pub mod sync_window;
pub mod time_range;

#[cfg(test)]
mod testing;

pub use error::{ShiftSyncError, ShiftSyncResult};
pub use shift::{ParsedCandidate, RemoteEvent, Shift, ShiftKey, Source};
