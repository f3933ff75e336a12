//! Remote store collaborator.
//!
//! The store owns remote ids and persistence. The core lists once per
//! cycle, then issues deletes and inserts one at a time; retries belong to
//! the store implementation.

mod provider;

pub use provider::{Provider, ProviderStore};

use crate::error::ShiftSyncResult;
use crate::shift::{RemoteEvent, Shift};
use crate::sync_window::SyncWindow;

#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Events carrying `label` that start inside `window`.
    async fn list(&self, window: &SyncWindow, label: &str) -> ShiftSyncResult<Vec<RemoteEvent>>;

    async fn insert(&self, shift: &Shift) -> ShiftSyncResult<RemoteEvent>;

    async fn delete(&self, remote_id: &str) -> ShiftSyncResult<()>;
}
