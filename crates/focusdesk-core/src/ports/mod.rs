//! Port definitions.
//!
//! Ports are the seams between the client and its infrastructure. The MCP
//! crate provides the production adapters; tests provide in-memory ones.

mod process_spawner;
mod tool_server_error;

pub use process_spawner::{
    BoxedReader, BoxedWriter, LaunchCommand, ProcessHandle, ProcessSpawner, SpawnedProcess,
};
pub use tool_server_error::{BoxError, ConnectStage, ToolServerError};
