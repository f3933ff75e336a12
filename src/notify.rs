//! Chat webhook notifications (Discord-style `{"content": ...}` body).

use serde::Serialize;
use shiftsync_core::error::{ShiftSyncError, ShiftSyncResult};
use shiftsync_core::notify::{Notifier, format_message};

#[derive(Serialize)]
struct WebhookPayload {
    content: String,
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Self {
        WebhookNotifier {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

fn payload(lines: &[String]) -> WebhookPayload {
    WebhookPayload {
        content: format_message(lines),
    }
}

impl Notifier for WebhookNotifier {
    async fn notify(&self, lines: &[String]) -> ShiftSyncResult<()> {
        self.client
            .post(&self.url)
            .json(&payload(lines))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ShiftSyncError::Notification(e.to_string()))?;

        log::info!("sent {} change line(s) to the webhook", lines.len());
        Ok(())
    }
}
