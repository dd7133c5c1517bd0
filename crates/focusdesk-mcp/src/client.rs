//! Tool-server client.
//!
//! Owns at most one [`Connection`] and the [`ToolDirectory`] discovered on
//! it. `connect`, `invoke`, `refresh_tools` and `disconnect` serialise on an
//! async mutex; `get_tools` and `state` only read a snapshot and never
//! suspend.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use focusdesk_core::{
    ClientSettings, ConnectStage, ConnectionState, LaunchSpec, ProcessSpawner, ToolCallResult,
    ToolDirectory, ToolServerError,
};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::connection::Connection;
use crate::launcher::{HostProvider, SystemHost, TokioSpawner, build_launch_command};
use crate::path::validate_script_path;
use crate::protocol::ServerInfo;
use crate::transport::TransportError;

/// Client for one subprocess-based MCP tool server.
pub struct ToolServerClient {
    settings: ClientSettings,
    spawner: Arc<dyn ProcessSpawner>,
    host: Arc<dyn HostProvider>,
    connection: Mutex<Option<Connection>>,
    directory: RwLock<Arc<ToolDirectory>>,
    state: RwLock<ConnectionState>,
}

impl ToolServerClient {
    /// Create a disconnected client that spawns real processes.
    pub fn new(settings: ClientSettings) -> Self {
        Self::with_dependencies(settings, Arc::new(TokioSpawner), Arc::new(SystemHost))
    }

    /// Create a client with injected process and host adapters.
    pub fn with_dependencies(
        settings: ClientSettings,
        spawner: Arc<dyn ProcessSpawner>,
        host: Arc<dyn HostProvider>,
    ) -> Self {
        Self {
            settings,
            spawner,
            host,
            connection: Mutex::new(None),
            directory: RwLock::new(Arc::new(ToolDirectory::empty())),
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Connect to the server script at `script_path`.
    ///
    /// Scripts whose extension maps to no runtime are rejected before
    /// anything is spawned.
    pub async fn connect(
        &self,
        script_path: impl Into<PathBuf>,
    ) -> Result<Arc<ToolDirectory>, ToolServerError> {
        let spec = LaunchSpec::from_path(script_path).inspect_err(|e| {
            tracing::error!(error = %e, "Rejected tool server script");
        })?;
        self.connect_spec(&spec).await
    }

    /// Connect to the server described by `spec`, replacing any live
    /// connection.
    ///
    /// On success the new tool directory is published and returned. On
    /// failure the server process is gone, the client is `Disconnected`, and
    /// the directory is whatever it was before the call.
    pub async fn connect_spec(
        &self,
        spec: &LaunchSpec,
    ) -> Result<Arc<ToolDirectory>, ToolServerError> {
        let mut slot = self.connection.lock().await;
        // Entered before the old connection goes, so an abandoned reconnect
        // still ends `Disconnected`.
        let guard = ConnectingGuard::enter(&self.state);
        if let Some(previous) = slot.take() {
            tracing::info!(
                server_name = %previous.server_info().name,
                "Closing previous tool server connection"
            );
            previous
                .close(self.settings.effective_shutdown_grace())
                .await;
        }

        match self.establish(spec).await {
            Ok((connection, directory)) => {
                let directory = Arc::new(directory);
                *slot = Some(connection);
                self.publish(Arc::clone(&directory));
                guard.complete();

                tracing::info!(
                    script = %spec.script_path().display(),
                    tool_count = directory.len(),
                    tools = ?directory.names(),
                    "Connected to tool server"
                );
                Ok(directory)
            }
            Err(e) => {
                tracing::error!(
                    script = %spec.script_path().display(),
                    runtime = %spec.runtime(),
                    stage = ?e.stage(),
                    error = %e,
                    "Failed to connect to tool server"
                );
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        spec: &LaunchSpec,
    ) -> Result<(Connection, ToolDirectory), ToolServerError> {
        validate_script_path(spec.script_path())
            .map_err(|e| ToolServerError::connection(ConnectStage::Spawn, e))?;
        let command = build_launch_command(spec, self.host.as_ref(), &self.settings)
            .map_err(|e| ToolServerError::connection(ConnectStage::Spawn, e))?;

        let connection = Connection::open(self.spawner.as_ref(), &command, &self.settings).await?;

        match connection.list_tools().await {
            Ok(tools) => Ok((connection, ToolDirectory::from_advertised(tools))),
            Err(e) => {
                connection
                    .close(self.settings.effective_shutdown_grace())
                    .await;
                Err(ToolServerError::connection(ConnectStage::Discovery, e))
            }
        }
    }

    /// Current tool directory snapshot.
    ///
    /// Empty until the first successful connect.
    pub fn get_tools(&self) -> Arc<ToolDirectory> {
        Arc::clone(&self.directory.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invoke a tool from the current directory.
    ///
    /// Names missing from the directory fail with `ToolNotFound` without
    /// contacting the server. A tool that reports its own failure yields
    /// `Ok` with `is_error` set.
    pub async fn invoke(
        &self,
        tool_name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallResult, ToolServerError> {
        let mut slot = self.connection.lock().await;

        if !self.get_tools().contains(tool_name) {
            tracing::warn!(tool = tool_name, "Requested tool is not in the directory");
            return Err(ToolServerError::ToolNotFound {
                name: tool_name.to_string(),
            });
        }

        let Some(connection) = slot.as_ref() else {
            tracing::error!(tool = tool_name, "Tool invoked without a live connection");
            return Err(ToolServerError::invocation(
                tool_name,
                TransportError::NotConnected,
            ));
        };

        match connection.call_tool(tool_name, arguments).await {
            Ok(result) => {
                if result.is_error {
                    tracing::warn!(tool = tool_name, "Tool reported an error");
                } else {
                    tracing::debug!(tool = tool_name, items = result.content.len(), "Tool call completed");
                }
                Ok(result)
            }
            Err(e) => {
                tracing::error!(tool = tool_name, error = %e, "Tool invocation failed");
                if e.is_disconnect() {
                    self.teardown(&mut slot).await;
                }
                Err(ToolServerError::invocation(tool_name, e))
            }
        }
    }

    /// Re-run discovery on the live connection and replace the directory.
    ///
    /// A failed round leaves the directory untouched unless the server is
    /// gone, in which case the connection is torn down.
    pub async fn refresh_tools(&self) -> Result<Arc<ToolDirectory>, ToolServerError> {
        let mut slot = self.connection.lock().await;
        let Some(connection) = slot.as_ref() else {
            return Err(ToolServerError::connection(
                ConnectStage::Discovery,
                TransportError::NotConnected,
            ));
        };

        match connection.list_tools().await {
            Ok(tools) => {
                let directory = Arc::new(ToolDirectory::from_advertised(tools));
                self.publish(Arc::clone(&directory));
                tracing::info!(
                    tool_count = directory.len(),
                    tools = ?directory.names(),
                    "Refreshed tool directory"
                );
                Ok(directory)
            }
            Err(e) => {
                tracing::error!(error = %e, "Tool discovery failed");
                if e.is_disconnect() {
                    self.teardown(&mut slot).await;
                }
                Err(ToolServerError::connection(ConnectStage::Discovery, e))
            }
        }
    }

    /// Whether the server announced a tool list change since the last
    /// discovery round.
    pub async fn tools_changed(&self) -> bool {
        self.connection
            .lock()
            .await
            .as_ref()
            .is_some_and(Connection::tools_changed)
    }

    /// Information the server reported during the handshake.
    pub async fn server_info(&self) -> Option<ServerInfo> {
        self.connection
            .lock()
            .await
            .as_ref()
            .map(|connection| connection.server_info().clone())
    }

    /// Check that the server process is still running.
    ///
    /// A server that has exited is torn down and the client becomes
    /// `Disconnected`.
    pub async fn is_connected(&self) -> bool {
        let mut slot = self.connection.lock().await;
        let alive = match slot.as_mut() {
            Some(connection) => connection.is_alive(),
            None => return false,
        };

        if !alive {
            tracing::warn!("Tool server process exited");
            self.teardown(&mut slot).await;
        }
        alive
    }

    /// Shut the server down and clear the directory.
    ///
    /// Returns whether a connection was open.
    pub async fn disconnect(&self) -> bool {
        let mut slot = self.connection.lock().await;
        let was_connected = slot.is_some();
        self.teardown(&mut slot).await;
        if was_connected {
            tracing::info!("Disconnected from tool server");
        }
        was_connected
    }

    async fn teardown(&self, slot: &mut Option<Connection>) {
        if let Some(connection) = slot.take() {
            connection
                .close(self.settings.effective_shutdown_grace())
                .await;
        }
        self.publish(Arc::new(ToolDirectory::empty()));
        set_state(&self.state, ConnectionState::Disconnected);
    }

    fn publish(&self, directory: Arc<ToolDirectory>) {
        *self
            .directory
            .write()
            .unwrap_or_else(PoisonError::into_inner) = directory;
    }
}

fn set_state(lock: &RwLock<ConnectionState>, state: ConnectionState) {
    *lock.write().unwrap_or_else(PoisonError::into_inner) = state;
}

/// Holds the client in `Connecting`; reverts to `Disconnected` when dropped
/// without [`ConnectingGuard::complete`], including when the connect future
/// is abandoned.
struct ConnectingGuard<'a> {
    state: &'a RwLock<ConnectionState>,
    completed: bool,
}

impl<'a> ConnectingGuard<'a> {
    fn enter(state: &'a RwLock<ConnectionState>) -> Self {
        set_state(state, ConnectionState::Connecting);
        Self {
            state,
            completed: false,
        }
    }

    fn complete(mut self) {
        set_state(self.state, ConnectionState::Connected);
        self.completed = true;
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            set_state(self.state, ConnectionState::Disconnected);
        }
    }
}
