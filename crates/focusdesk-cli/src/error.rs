//! CLI-specific error types and mappings.
//!
//! Maps [`ToolServerError`] and [`SettingsError`] to exit codes and
//! user-facing messages.

use focusdesk_core::{SettingsError, ToolServerError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// The script cannot be run by any supported runtime.
    #[error("{0}")]
    UnsupportedRuntime(String),

    /// The requested tool is not exposed by the server.
    #[error("{0}")]
    ToolNotFound(String),

    /// Spawning, handshake or discovery failed.
    #[error("{0}")]
    Connection(String),

    /// The request for a tool call failed.
    #[error("{0}")]
    Invocation(String),

    /// The tool ran and reported a failure.
    #[error("Tool '{0}' reported an error")]
    ToolReported(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where one fits:
    /// - 1: The tool reported an error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Specific error categories
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ToolReported(_) => 1,
            Self::Arguments(_) => 2,
            Self::UnsupportedRuntime(_) => 64, // EX_USAGE
            Self::ToolNotFound(_) => 65,       // EX_DATAERR
            Self::Connection(_) => 69,         // EX_UNAVAILABLE
            Self::Invocation(_) => 70,         // EX_SOFTWARE
            Self::Config(_) => 78,             // EX_CONFIG
        }
    }
}

impl From<ToolServerError> for CliError {
    fn from(err: ToolServerError) -> Self {
        let message = err.to_string();
        match err {
            ToolServerError::UnsupportedRuntime { .. } => Self::UnsupportedRuntime(message),
            ToolServerError::Connection { .. } => Self::Connection(message),
            ToolServerError::ToolNotFound { .. } => Self::ToolNotFound(message),
            ToolServerError::Invocation { .. } => Self::Invocation(message),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Arguments(err.to_string())
    }
}
