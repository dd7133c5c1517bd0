use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a tool-server client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No server process is attached
    #[default]
    Disconnected,
    /// A connect call is spawning the server or awaiting handshake/discovery
    Connecting,
    /// Handshake and discovery completed; the tool directory is live
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(label)
    }
}
