//! JSON-RPC over stdio transport.
//!
//! One JSON object per line in each direction. The transport works on any
//! pair of async byte streams, so a child process's stdio and an in-memory
//! duplex pipe are handled the same way.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use focusdesk_core::{BoxedReader, BoxedWriter};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout_at};

use crate::protocol::{
    IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest, METHOD_NOT_FOUND,
    METHOD_PING, MessageKind, NOTIFICATION_TOOLS_CHANGED, response_line,
};

/// Errors that can occur while talking to a tool server.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to communicate with tool server: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tool server closed the connection")]
    Closed,

    #[error("Timed out after {0:?} waiting for tool server response")]
    Timeout(Duration),

    /// The server stopped reading mid-message; its stdin may hold a partial line.
    #[error("Timed out after {0:?} writing to tool server")]
    WriteStalled(Duration),

    #[error("Tool server returned error: code={code}, message={message}")]
    Server { code: i64, message: String },

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("Not connected to a tool server")]
    NotConnected,
}

impl TransportError {
    /// Whether the error means the server can no longer be reached.
    pub const fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Closed | Self::WriteStalled(_) | Self::NotConnected
        )
    }
}

/// Bi-directional JSON-RPC transport over a server's stdin/stdout.
pub struct StdioTransport {
    label: String,
    writer: Mutex<BoxedWriter>,
    reader: Mutex<BufReader<BoxedReader>>,
    next_id: AtomicU64,
    tools_changed: AtomicBool,
}

impl StdioTransport {
    /// Create a transport; `label` names the server in logs.
    pub fn new(label: impl Into<String>, writer: BoxedWriter, reader: BoxedReader) -> Self {
        Self {
            label: label.into(),
            writer: Mutex::new(writer),
            reader: Mutex::new(BufReader::new(reader)),
            next_id: AtomicU64::new(1),
            tools_changed: AtomicBool::new(false),
        }
    }

    /// Send a request and wait for the response with the matching id.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
        limit: Duration,
    ) -> Result<T, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = serde_json::to_value(JsonRpcRequest::new(id, method, params))?;

        let deadline = Instant::now() + limit;
        timeout_at(deadline, self.write_line(&request))
            .await
            .map_err(|_| TransportError::WriteStalled(limit))??;
        let message = timeout_at(deadline, self.read_response(id))
            .await
            .map_err(|_| TransportError::Timeout(limit))??;

        if let Some(err) = message.error {
            return Err(TransportError::Server {
                code: err.code,
                message: err.message,
            });
        }

        let result = message.result.ok_or_else(|| {
            TransportError::Protocol(format!("Response to '{method}' has no result"))
        })?;

        serde_json::from_value(result).map_err(Into::into)
    }

    /// Send a notification (no response expected).
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), TransportError> {
        let notification = JsonRpcNotification::new(method, params);
        self.write_line(&serde_json::to_value(&notification)?).await
    }

    /// Whether the server announced a tool list change since the last reset.
    pub fn tools_changed(&self) -> bool {
        self.tools_changed.load(Ordering::SeqCst)
    }

    pub fn reset_tools_changed(&self) {
        self.tools_changed.store(false, Ordering::SeqCst);
    }

    /// Flush and shut down the write half so the server sees EOF on stdin.
    pub async fn close_input(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            tracing::debug!(server = %self.label, error = %e, "Closing server stdin failed");
        }
    }

    async fn write_line(&self, message: &Value) -> Result<(), TransportError> {
        let line = serde_json::to_string(message)? + "\n";
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read lines until the response for `id` arrives.
    ///
    /// Blank lines, non-JSON output, stale responses and notifications are
    /// skipped; server requests are answered inline.
    async fn read_response(&self, id: u64) -> Result<IncomingMessage, TransportError> {
        let mut reader = self.reader.lock().await;
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Err(TransportError::Closed);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Ok(message) = serde_json::from_str::<IncomingMessage>(trimmed) else {
                tracing::debug!(server = %self.label, line = trimmed, "Skipping non-JSON-RPC output");
                continue;
            };

            match message.kind() {
                MessageKind::Response { id: Some(got) } if got == id => return Ok(message),
                MessageKind::Response { id: got } => {
                    tracing::debug!(server = %self.label, expected = id, got = ?got, "Skipping unmatched response");
                }
                MessageKind::Notification { method } => self.on_notification(method),
                MessageKind::Request { id: request_id, method } => {
                    self.answer_server_request(request_id, method).await?;
                }
            }
        }
    }

    fn on_notification(&self, method: &str) {
        if method == NOTIFICATION_TOOLS_CHANGED {
            tracing::info!(server = %self.label, "Tool server reported a tool list change");
            self.tools_changed.store(true, Ordering::SeqCst);
        } else {
            tracing::debug!(server = %self.label, method, "Ignoring server notification");
        }
    }

    async fn answer_server_request(&self, id: &Value, method: &str) -> Result<(), TransportError> {
        let outcome = if method == METHOD_PING {
            Ok(json!({}))
        } else {
            tracing::debug!(server = %self.label, method, "Rejecting unsupported server request");
            Err(JsonRpcError {
                code: METHOD_NOT_FOUND,
                message: format!("Method not found: {method}"),
                data: None,
            })
        };
        self.write_line(&response_line(id, outcome)).await
    }
}
