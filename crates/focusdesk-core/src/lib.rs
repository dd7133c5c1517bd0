//! Core domain types and port definitions for the focusdesk tool-server client.
//!
//! This crate has no process or protocol code. It defines what a launch
//! specification and a tool directory are, the error taxonomy every layer
//! reports through, the client settings, and the [`ProcessSpawner`] port that
//! the MCP crate implements with `tokio::process`.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    ConnectionState, LaunchSpec, RuntimeKind, ToolCallResult, ToolContent, ToolDescriptor,
    ToolDirectory,
};
pub use ports::{
    BoxError, BoxedReader, BoxedWriter, ConnectStage, LaunchCommand, ProcessHandle,
    ProcessSpawner, SpawnedProcess, ToolServerError,
};
pub use settings::{
    ClientSettings, DEFAULT_CLIENT_NAME, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_GRACE_MS,
    SettingsError, validate_settings,
};
