//! Store provider subprocess.
//!
//! Each request spawns `shiftsync-store-<name>`, writes one JSON request to
//! its stdin and reads one JSON response from its stdout. Providers manage
//! their own credentials; the core only forwards the `[store]` parameters
//! from the config file.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::RemoteStore;
use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::protocol::{
    DeleteEvent, InsertShift, ListEvents, ProviderCommand, Request, Response, ShiftPayload,
};
use crate::shift::{RemoteEvent, Shift};
use crate::sync_window::SyncWindow;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
enum Launch {
    /// Resolved as `shiftsync-store-<name>` on PATH
    Named(String),
    /// Explicit program and leading arguments
    Program(PathBuf, Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Provider {
    name: String,
    launch: Launch,
}

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider {
            name: name.to_string(),
            launch: Launch::Named(name.to_string()),
        }
    }

    /// Run `program args...` instead of looking the provider up on PATH.
    pub fn from_program(name: &str, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Provider {
            name: name.to_string(),
            launch: Launch::Program(program.into(), args),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn command(&self) -> ShiftSyncResult<Command> {
        match &self.launch {
            Launch::Named(name) => {
                let binary_name = format!("shiftsync-store-{name}");
                let binary_path = which::which(&binary_name).map_err(|_| {
                    ShiftSyncError::ProviderNotInstalled(format!(
                        "Store provider '{name}' not found: no '{binary_name}' in PATH"
                    ))
                })?;
                Ok(Command::new(binary_path))
            }
            Launch::Program(program, args) => {
                let mut command = Command::new(program);
                command.args(args);
                Ok(command)
            }
        }
    }

    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> ShiftSyncResult<C::Response> {
        timeout(PROVIDER_TIMEOUT, self.call_raw(cmd))
            .await
            .map_err(|_| ShiftSyncError::ProviderTimeout(PROVIDER_TIMEOUT.as_secs()))?
    }

    async fn call_raw<C: ProviderCommand>(&self, cmd: C) -> ShiftSyncResult<C::Response> {
        let params =
            serde_json::to_value(cmd).map_err(|e| ShiftSyncError::Serialization(e.to_string()))?;
        let request = Request {
            command: C::command(),
            params,
        };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| ShiftSyncError::Serialization(e.to_string()))?;

        let mut child = self
            .command()?
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ShiftSyncError::Provider(format!("Failed to spawn provider '{}': {e}", self.name))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ShiftSyncError::Provider("provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(ShiftSyncError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(ShiftSyncError::Provider(
                "Provider returned no response".into(),
            ));
        }

        let response: Response<C::Response> = serde_json::from_str(&response_str)
            .map_err(|e| ShiftSyncError::Provider(format!("Failed to parse response: {e}")))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(ShiftSyncError::Provider(error)),
        }
    }
}

/// [`RemoteStore`] backed by a store provider and its config parameters.
#[derive(Debug, Clone)]
pub struct ProviderStore {
    provider: Provider,
    config: serde_json::Map<String, serde_json::Value>,
}

impl ProviderStore {
    pub fn new(provider: Provider, config: serde_json::Map<String, serde_json::Value>) -> Self {
        ProviderStore { provider, config }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}

impl RemoteStore for ProviderStore {
    async fn list(&self, window: &SyncWindow, label: &str) -> ShiftSyncResult<Vec<RemoteEvent>> {
        self.provider
            .call(ListEvents {
                store_config: self.config.clone(),
                from: window.from_rfc3339(),
                to: window.to_rfc3339(),
                label: label.to_string(),
            })
            .await
    }

    async fn insert(&self, shift: &Shift) -> ShiftSyncResult<RemoteEvent> {
        self.provider
            .call(InsertShift {
                store_config: self.config.clone(),
                shift: ShiftPayload::from(shift),
            })
            .await
            .map_err(|e| ShiftSyncError::RemoteOperation(format!("insert {shift}: {e}")))
    }

    async fn delete(&self, remote_id: &str) -> ShiftSyncResult<()> {
        self.provider
            .call(DeleteEvent {
                store_config: self.config.clone(),
                remote_id: remote_id.to_string(),
            })
            .await
            .map_err(|e| ShiftSyncError::RemoteOperation(format!("delete {remote_id}: {e}")))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn scripted(script: &str) -> ProviderStore {
        let provider = Provider::from_program(
            "script",
            "sh",
            vec!["-c".to_string(), script.to_string()],
        );
        let mut config = serde_json::Map::new();
        config.insert("calendar_id".into(), "primary".into());
        ProviderStore::new(provider, config)
    }

    fn window() -> SyncWindow {
        let start = New_York.with_ymd_and_hms(2025, 8, 15, 10, 0, 0).unwrap();
        SyncWindow::starting_at(start.with_timezone(&chrono::Utc))
    }

    #[tokio::test]
    async fn test_list_parses_remote_events() {
        let store = scripted(
            r#"read -r line
case "$line" in
  *'"list_events"'*'"calendar_id":"primary"'*)
    echo '{"status":"success","data":[{"remote_id":"r1","label":"Work","start":"2025-08-15T10:00:00-04:00","end":"2025-08-15T18:00:00-04:00"}]}' ;;
  *) echo '{"status":"error","error":"unexpected request"}' ;;
esac"#,
        );

        let events = store.list(&window(), "Work").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].remote_id, "r1");
    }

    #[tokio::test]
    async fn test_insert_failure_is_a_remote_operation_error() {
        let store = scripted(r#"read -r line; echo '{"status":"error","error":"quota"}'"#);
        let shift = Shift::new(
            New_York.with_ymd_and_hms(2025, 8, 17, 7, 0, 0).unwrap(),
            New_York.with_ymd_and_hms(2025, 8, 17, 16, 0, 0).unwrap(),
            "Work",
        );

        let err = store.insert(&shift).await.unwrap_err();
        assert!(matches!(err, ShiftSyncError::RemoteOperation(msg) if msg.contains("quota")));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let store = scripted("read -r line; exit 3");
        let err = store.delete("r1").await.unwrap_err();
        assert!(err.to_string().contains("status: 3"));
    }

    #[tokio::test]
    async fn test_missing_provider_binary() {
        let store = ProviderStore::new(
            Provider::from_name("does-not-exist-anywhere"),
            serde_json::Map::new(),
        );
        let err = store.list(&window(), "Work").await.unwrap_err();
        assert!(matches!(err, ShiftSyncError::ProviderNotInstalled(_)));
    }
}
