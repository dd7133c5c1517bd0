//! Interpreter resolution and process spawning for tool-server scripts.
//!
//! [`build_launch_command`] turns a [`LaunchSpec`] into a [`LaunchCommand`]
//! once; [`TokioSpawner`] is the production [`ProcessSpawner`].

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use focusdesk_core::{
    ClientSettings, LaunchCommand, LaunchSpec, ProcessHandle, ProcessSpawner, RuntimeKind,
    SpawnedProcess,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};

use crate::path::build_effective_path;

/// Python interpreter on Unix-like hosts.
pub const PYTHON_UNIX: &str = "python3";

/// Python interpreter on Windows hosts.
pub const PYTHON_WINDOWS: &str = "python";

/// Facts about the host needed to pick an interpreter (injectable for testing).
#[cfg_attr(test, mockall::automock)]
pub trait HostProvider: Send + Sync {
    /// Path of the executable running the client.
    fn current_exe(&self) -> io::Result<PathBuf>;

    /// Whether the host is Windows.
    fn is_windows(&self) -> bool;
}

/// Production host provider backed by the running process.
pub struct SystemHost;

impl HostProvider for SystemHost {
    fn current_exe(&self) -> io::Result<PathBuf> {
        std::env::current_exe()
    }

    fn is_windows(&self) -> bool {
        cfg!(windows)
    }
}

/// Pick the interpreter for a runtime.
///
/// An interpreter configured in `settings` wins; otherwise JavaScript runs
/// with the current executable and Python with `python3` (`python` on
/// Windows).
pub fn resolve_program(
    runtime: RuntimeKind,
    host: &dyn HostProvider,
    settings: &ClientSettings,
) -> io::Result<PathBuf> {
    match runtime {
        RuntimeKind::JavaScript => match settings.javascript_runtime {
            Some(ref program) => Ok(PathBuf::from(program)),
            None => host.current_exe(),
        },
        RuntimeKind::Python => match settings.python_runtime {
            Some(ref program) => Ok(PathBuf::from(program)),
            None if host.is_windows() => Ok(PathBuf::from(PYTHON_WINDOWS)),
            None => Ok(PathBuf::from(PYTHON_UNIX)),
        },
    }
}

/// Resolve the full command for a launch spec: interpreter plus the script
/// path as its sole argument.
pub fn build_launch_command(
    spec: &LaunchSpec,
    host: &dyn HostProvider,
    settings: &ClientSettings,
) -> io::Result<LaunchCommand> {
    let program = resolve_program(spec.runtime(), host, settings)?;
    Ok(
        LaunchCommand::new(program, vec![spec.script_path().as_os_str().to_owned()])
            .with_path_extra(settings.path_extra.clone()),
    )
}

/// Spawns tool servers with `tokio::process`.
///
/// Children are killed when their handle is dropped, so an abandoned
/// connect never leaves a server running.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

impl ProcessSpawner for TokioSpawner {
    fn spawn(&self, command: &LaunchCommand) -> io::Result<SpawnedProcess> {
        let script = command.args.first().map_or(Path::new(""), Path::new);
        let effective_path =
            build_effective_path(&command.program, script, command.path_extra.as_deref());

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .env("PATH", &effective_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to spawn '{}': {e}\nArgs: {:?}\nEffective PATH: {}",
                        command.program.display(),
                        command.args,
                        effective_path.to_string_lossy()
                    ),
                )
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("Failed to get server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("Failed to get server stdout"))?;
        if let Some(stderr) = child.stderr.take() {
            forward_stderr(script.display().to_string(), stderr);
        }

        tracing::debug!(
            program = %command.program.display(),
            pid = ?child.id(),
            "Spawned tool server process"
        );

        Ok(SpawnedProcess {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            handle: Box::new(TokioProcessHandle { child }),
        })
    }
}

/// Relay the server's stderr into the log, one event per line.
fn forward_stderr(server: String, stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(server = %server, "{line}");
        }
    });
}

struct TokioProcessHandle {
    child: Child,
}

#[async_trait]
impl ProcessHandle for TokioProcessHandle {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn has_exited(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }

    async fn terminate(&mut self, grace: Duration) -> io::Result<()> {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(%status, "Tool server exited");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::debug!(pid = ?self.child.id(), "Tool server still running, killing");
                self.child.kill().await
            }
        }
    }
}
