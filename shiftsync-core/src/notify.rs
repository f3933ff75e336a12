//! Notification collaborator.

use crate::error::ShiftSyncResult;

/// Receives the human-readable change lines of a cycle. Only called with a
/// non-empty list.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, lines: &[String]) -> ShiftSyncResult<()>;
}

/// An unconfigured notifier is a no-op.
impl<N: Notifier> Notifier for Option<N> {
    async fn notify(&self, lines: &[String]) -> ShiftSyncResult<()> {
        match self {
            Some(inner) => inner.notify(lines).await,
            None => Ok(()),
        }
    }
}

/// Message body the way a chat webhook shows it.
pub fn format_message(lines: &[String]) -> String {
    format!("📅 **Schedule Update:**\n{}", lines.join("\n"))
}
