//! Reconciliation of the canonical shift set against the remote store.

mod apply;
mod change_kind;
mod reconciliation;

pub use apply::{ApplyReport, apply};
pub use change_kind::ChangeKind;
pub use reconciliation::{DateChange, Reconciliation, classify};
