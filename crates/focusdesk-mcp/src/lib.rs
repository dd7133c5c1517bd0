//! MCP tool-server client for focusdesk.
//!
//! Launches a script-based MCP server as a child process, speaks JSON-RPC
//! with it over stdio, and keeps the directory of tools it exposes.
//!
//! ```rust,no_run
//! use focusdesk_core::ClientSettings;
//! use focusdesk_mcp::ToolServerClient;
//!
//! # async fn run() -> Result<(), focusdesk_core::ToolServerError> {
//! let client = ToolServerClient::new(ClientSettings::with_defaults());
//! let tools = client.connect("./servers/weather.py").await?;
//! for tool in tools.tools() {
//!     println!("{}", tool.name);
//! }
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub(crate) mod client;
pub(crate) mod connection;
pub mod launcher;
pub(crate) mod path;
pub mod protocol;
pub mod transport;

#[cfg(test)]
mod test_utils;

// Re-export domain types from core for convenience
pub use focusdesk_core::{
    ClientSettings, ConnectStage, ConnectionState, LaunchSpec, RuntimeKind, ToolCallResult,
    ToolContent, ToolDescriptor, ToolDirectory, ToolServerError,
};

// Re-export this crate's public types
pub use client::ToolServerClient;
pub use launcher::{HostProvider, SystemHost, TokioSpawner};
pub use protocol::{PROTOCOL_VERSION, ServerInfo};
pub use transport::TransportError;
