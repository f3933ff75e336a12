//! Renderer running as a long-lived child process.
//!
//! Requests and responses are single JSON lines; the process lives for as
//! long as this handle does. A request that times out or gets an unreadable
//! reply leaves the stream out of step, so the process is killed and every
//! later call fails.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::time::timeout;

use super::Renderer;
use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::parse::{DayCell, LiveColumnMap};
use crate::protocol::{
    ColumnDates, NextPeriod, PanelText, RenderCommand, RendererCommand, Request, Reset, Response,
    SelectDay, Snapshot,
};

/// Page loads and panel waits happen inside the renderer, so this is generous.
const RENDER_TIMEOUT: Duration = Duration::from_secs(60);

pub struct RendererProcess {
    name: String,
    config: serde_json::Map<String, serde_json::Value>,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    timeout: Duration,
    /// Why the session stopped being usable.
    broken: Option<String>,
}

impl RendererProcess {
    /// Spawn `shiftsync-renderer-<name>` from PATH.
    pub fn spawn(
        name: &str,
        config: serde_json::Map<String, serde_json::Value>,
    ) -> ShiftSyncResult<Self> {
        let binary_name = format!("shiftsync-renderer-{name}");
        let binary_path: PathBuf = which::which(&binary_name).map_err(|_| {
            ShiftSyncError::ProviderNotInstalled(format!(
                "Renderer '{name}' not found: no '{binary_name}' in PATH"
            ))
        })?;

        Self::spawn_command(name, TokioCommand::new(binary_path), config)
    }

    /// Spawn an arbitrary command speaking the renderer protocol.
    pub fn spawn_command(
        name: &str,
        mut command: TokioCommand,
        config: serde_json::Map<String, serde_json::Value>,
    ) -> ShiftSyncResult<Self> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ShiftSyncError::Renderer(format!("Failed to spawn renderer '{name}': {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ShiftSyncError::Renderer("renderer stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ShiftSyncError::Renderer("renderer stdout unavailable".into()))?;

        Ok(RendererProcess {
            name: name.to_string(),
            config,
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            timeout: RENDER_TIMEOUT,
            broken: None,
        })
    }

    /// Per-request deadline; defaults to 60s.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close stdin and wait for the renderer to exit, killing it on timeout.
    pub async fn shutdown(mut self) -> ShiftSyncResult<()> {
        drop(self.stdin);
        if timeout(Duration::from_secs(5), self.child.wait()).await.is_err() {
            log::warn!("renderer '{}' did not exit; killing it", self.name);
            self.child.kill().await?;
        }
        Ok(())
    }

    async fn call<C: RendererCommand>(&mut self, cmd: C) -> ShiftSyncResult<C::Response> {
        if let Some(reason) = &self.broken {
            return Err(ShiftSyncError::Renderer(format!(
                "renderer '{}' is no longer usable: {reason}",
                self.name
            )));
        }

        let outcome = timeout(self.timeout, self.exchange(C::command(), cmd)).await;
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                self.poison(e.to_string());
                return Err(e);
            }
            Err(_) => {
                self.poison(format!("no reply to {:?} within {:?}", C::command(), self.timeout));
                return Err(ShiftSyncError::ProviderTimeout(self.timeout.as_secs()));
            }
        };

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(ShiftSyncError::Renderer(error)),
        }
    }

    /// Write one request line and read one reply line.
    async fn exchange<P: Serialize, R: DeserializeOwned>(
        &mut self,
        command: RenderCommand,
        params: P,
    ) -> ShiftSyncResult<Response<R>> {
        let params =
            serde_json::to_value(params).map_err(|e| ShiftSyncError::Serialization(e.to_string()))?;
        let request_json = serde_json::to_string(&Request { command, params })
            .map_err(|e| ShiftSyncError::Serialization(e.to_string()))?;

        self.stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        self.stdin.flush().await?;

        let line = self.stdout.next_line().await?.ok_or_else(|| {
            ShiftSyncError::Renderer(format!("renderer '{}' closed its output", self.name))
        })?;

        serde_json::from_str(&line)
            .map_err(|e| ShiftSyncError::Renderer(format!("Failed to parse response: {e}")))
    }

    fn poison(&mut self, reason: String) {
        log::warn!("renderer '{}' abandoned: {reason}", self.name);
        if let Err(e) = self.child.start_kill() {
            log::debug!("renderer '{}' already gone: {e}", self.name);
        }
        self.broken = Some(reason);
    }
}

impl Renderer for RendererProcess {
    async fn reset(&mut self) -> ShiftSyncResult<()> {
        let renderer_config = self.config.clone();
        self.call(Reset { renderer_config }).await
    }

    async fn snapshot(&mut self) -> ShiftSyncResult<Option<String>> {
        self.call(Snapshot {}).await
    }

    async fn column_dates(&mut self) -> ShiftSyncResult<Option<LiveColumnMap>> {
        self.call(ColumnDates {}).await
    }

    async fn select_day(&mut self, cell: &DayCell) -> ShiftSyncResult<bool> {
        self.call(SelectDay { cell: cell.clone() }).await
    }

    async fn panel_text(&mut self) -> ShiftSyncResult<Option<String>> {
        self.call(PanelText {}).await
    }

    async fn next_period(&mut self) -> ShiftSyncResult<bool> {
        self.call(NextPeriod {}).await
    }
}
