//! Tool-server client error types.
//!
//! Every operation of the client reports through [`ToolServerError`]. Lower
//! layers keep their own error enums and travel here as the boxed `source`,
//! so the original cause stays available through `Error::source`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed underlying cause carried by connection and invocation errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Step of `connect` that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectStage {
    /// Resolving the interpreter or starting the process.
    Spawn,
    /// The `initialize` exchange.
    Handshake,
    /// Listing the server's tools.
    Discovery,
}

impl fmt::Display for ConnectStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Spawn => "spawn",
            Self::Handshake => "handshake",
            Self::Discovery => "discovery",
        };
        f.write_str(label)
    }
}

/// Errors surfaced by the tool-server client.
#[derive(Debug, Error)]
pub enum ToolServerError {
    /// The script extension maps to no known runtime. Nothing was spawned.
    #[error("Unsupported server script '{path}': expected a .js, .mjs or .py file")]
    UnsupportedRuntime { path: String },

    /// Spawn, handshake or discovery failed.
    #[error("Failed to connect to tool server ({stage}): {source}")]
    Connection {
        stage: ConnectStage,
        #[source]
        source: BoxError,
    },

    /// The requested tool is not in the current directory.
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    /// The server rejected the call or the transport failed mid-request.
    #[error("Invocation of tool '{tool}' failed: {source}")]
    Invocation {
        tool: String,
        #[source]
        source: BoxError,
    },
}

impl ToolServerError {
    /// Wrap a failure from one of the `connect` stages.
    pub fn connection(stage: ConnectStage, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            stage,
            source: source.into(),
        }
    }

    /// Wrap a failure of a tool call.
    pub fn invocation(tool: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Invocation {
            tool: tool.into(),
            source: source.into(),
        }
    }

    /// The failed connect stage, if this is a connection error.
    pub const fn stage(&self) -> Option<ConnectStage> {
        match self {
            Self::Connection { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
