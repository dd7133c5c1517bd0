//! Domain types for the tool-server client.
//!
//! These types describe tool servers and their tools independent of any
//! infrastructure concerns (process management, wire format, etc.).
//!
//! # Design
//!
//! - `RuntimeKind` - Closed set of script runtimes a server can be launched with
//! - `LaunchSpec` - A validated script path together with its runtime
//! - `ToolDescriptor` - One tool advertised by a server
//! - `ToolDirectory` - The ordered tool list of one connection
//! - `ToolCallResult` - Result of a tool invocation
//! - `ConnectionState` - Lifecycle state of the client

mod launch;
mod state;
mod tool;

pub use launch::{LaunchSpec, RuntimeKind};
pub use state::ConnectionState;
pub use tool::{ToolCallResult, ToolContent, ToolDescriptor, ToolDirectory};
