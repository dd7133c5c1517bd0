//! Process spawner trait definition.
//!
//! This port defines how the client starts a tool-server process and gets
//! hold of its stdio. Implementations own all OS process details; the client
//! only sees two byte streams and a handle it can terminate.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Readable half of a process transport (the child's stdout).
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Writable half of a process transport (the child's stdin).
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Fully resolved command for a tool-server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Interpreter to execute.
    pub program: PathBuf,
    /// Arguments; for script servers this is exactly the script path.
    pub args: Vec<OsString>,
    /// Extra PATH entries for the child, platform separator joined.
    pub path_extra: Option<String>,
}

impl LaunchCommand {
    /// Create a command with no extra PATH entries.
    pub fn new(program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
            path_extra: None,
        }
    }

    /// Set the extra PATH entries.
    #[must_use]
    pub fn with_path_extra(mut self, path_extra: Option<String>) -> Self {
        self.path_extra = path_extra;
        self
    }
}

/// A started process: its message streams plus the handle that owns it.
pub struct SpawnedProcess {
    pub stdin: BoxedWriter,
    pub stdout: BoxedReader,
    pub handle: Box<dyn ProcessHandle>,
}

/// Ownership handle for a running tool-server process.
///
/// Dropping the handle must not leave the process running.
#[async_trait]
pub trait ProcessHandle: Send + Sync {
    /// OS process id, if the process has one.
    fn id(&self) -> Option<u32>;

    /// Whether the process has already exited.
    fn has_exited(&mut self) -> bool;

    /// Wait up to `grace` for the process to exit on its own, then kill it.
    ///
    /// Callers close the process's stdin first so well-behaved servers can
    /// shut down cleanly.
    async fn terminate(&mut self, grace: Duration) -> io::Result<()>;
}

/// Starts tool-server processes.
pub trait ProcessSpawner: Send + Sync {
    /// Spawn `command` with piped stdin/stdout.
    fn spawn(&self, command: &LaunchCommand) -> io::Result<SpawnedProcess>;
}
