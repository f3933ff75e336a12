//! Applying a reconciliation to the remote store.

use crate::diff::{DateChange, Reconciliation, classify};
use crate::remote::RemoteStore;
use crate::shift::{RemoteEvent, Shift};

/// What actually happened against the store.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub deleted: Vec<RemoteEvent>,
    pub inserted: Vec<Shift>,
    pub duplicates_removed: usize,
    pub failed_deletes: usize,
    pub failed_inserts: usize,
}

impl ApplyReport {
    pub fn failures(&self) -> usize {
        self.failed_deletes + self.failed_inserts
    }

    /// Classification of the operations that succeeded.
    pub fn changes(&self, reconciliation: &Reconciliation) -> Vec<DateChange> {
        classify(&self.deleted, &self.inserted, &reconciliation.zone)
    }
}

/// Deletes (including duplicate cleanup) first, then inserts, one at a
/// time. A failed operation is logged and counted; the rest of the batch
/// still runs.
pub async fn apply(reconciliation: &Reconciliation, store: &impl RemoteStore) -> ApplyReport {
    let mut report = ApplyReport::default();

    for event in &reconciliation.to_delete {
        match store.delete(&event.remote_id).await {
            Ok(()) => {
                log::info!("deleted {} ({})", event.remote_id, event.key());
                report.deleted.push(event.clone());
            }
            Err(e) => {
                log::warn!("failed to delete {}: {e}", event.remote_id);
                report.failed_deletes += 1;
            }
        }
    }

    for event in &reconciliation.duplicates {
        match store.delete(&event.remote_id).await {
            Ok(()) => {
                log::info!("deleted duplicate {} ({})", event.remote_id, event.key());
                report.duplicates_removed += 1;
            }
            Err(e) => {
                log::warn!("failed to delete duplicate {}: {e}", event.remote_id);
                report.failed_deletes += 1;
            }
        }
    }

    for shift in &reconciliation.to_insert {
        match store.insert(shift).await {
            Ok(created) => {
                log::info!("inserted {shift} as {}", created.remote_id);
                report.inserted.push(shift.clone());
            }
            Err(e) => {
                log::warn!("failed to insert {shift}: {e}");
                report.failed_inserts += 1;
            }
        }
    }

    report
}
