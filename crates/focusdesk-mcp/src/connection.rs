//! A live connection: one server process and the transport over its stdio.
//!
//! [`Connection::open`] spawns and handshakes; [`Connection::close`] shuts the
//! process down. If opening fails the process is terminated before the error
//! is returned, and a dropped connection kills its process through the
//! spawner's handle.

use std::time::Duration;

use focusdesk_core::{
    ClientSettings, ConnectStage, LaunchCommand, ProcessHandle, ProcessSpawner, SpawnedProcess,
    ToolCallResult, ToolDescriptor, ToolServerError,
};
use serde_json::{Map, Value};

use crate::protocol::{
    CallToolResponse, InitializeResult, ListToolsPage, METHOD_INITIALIZE, METHOD_INITIALIZED,
    METHOD_NOT_FOUND, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, call_tool_params, initialize_params, list_tools_params, project_tool,
};
use crate::transport::{StdioTransport, TransportError};

/// Upper bound on `tools/list` pages followed in one discovery round.
const MAX_TOOL_PAGES: usize = 100;

pub struct Connection {
    handle: Box<dyn ProcessHandle>,
    transport: StdioTransport,
    server_info: ServerInfo,
    capabilities: ServerCapabilities,
    request_timeout: Duration,
}

impl Connection {
    /// Spawn the server and complete the `initialize` handshake.
    pub async fn open(
        spawner: &dyn ProcessSpawner,
        command: &LaunchCommand,
        settings: &ClientSettings,
    ) -> Result<Self, ToolServerError> {
        let SpawnedProcess {
            stdin,
            stdout,
            mut handle,
        } = spawner
            .spawn(command)
            .map_err(|e| ToolServerError::connection(ConnectStage::Spawn, e))?;

        let label = command
            .args
            .first()
            .map_or_else(|| command.program.display().to_string(), |arg| {
                arg.to_string_lossy().into_owned()
            });
        let transport = StdioTransport::new(label, stdin, stdout);
        let request_timeout = settings.effective_request_timeout();

        match initialize(&transport, settings, request_timeout).await {
            Ok(init) => {
                tracing::debug!(
                    server_name = %init.server_info.name,
                    server_version = ?init.server_info.version,
                    protocol_version = %init.protocol_version,
                    pid = ?handle.id(),
                    "Tool server handshake complete"
                );
                Ok(Self {
                    handle,
                    transport,
                    server_info: init.server_info,
                    capabilities: init.capabilities,
                    request_timeout,
                })
            }
            Err(e) => {
                transport.close_input().await;
                if let Err(kill_err) = handle.terminate(settings.effective_shutdown_grace()).await
                {
                    tracing::warn!(error = %kill_err, "Failed to terminate tool server after handshake failure");
                }
                Err(ToolServerError::connection(ConnectStage::Handshake, e))
            }
        }
    }

    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Fetch every tool the server advertises, following pagination.
    ///
    /// `tools/list` is sent even when the handshake did not advertise the
    /// tools capability; only a "method not found" reply means the server
    /// has no tools. Malformed entries are dropped.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, TransportError> {
        if !self.capabilities.supports_tools() {
            tracing::debug!(
                server_name = %self.server_info.name,
                "Server did not advertise tools, listing anyway"
            );
        }

        self.transport.reset_tools_changed();

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_TOOL_PAGES {
            let page: ListToolsPage = match self
                .transport
                .request(
                    METHOD_TOOLS_LIST,
                    list_tools_params(cursor.as_deref()),
                    self.request_timeout,
                )
                .await
            {
                Ok(page) => page,
                Err(TransportError::Server { code, .. })
                    if code == METHOD_NOT_FOUND && cursor.is_none() =>
                {
                    tracing::debug!(server_name = %self.server_info.name, "Server does not implement tools/list");
                    return Ok(Vec::new());
                }
                Err(e) => return Err(e),
            };

            tools.extend(page.tools.into_iter().filter_map(project_tool));

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }

        Err(TransportError::Protocol(format!(
            "tools/list did not finish within {MAX_TOOL_PAGES} pages"
        )))
    }

    /// Invoke a tool and wait for its result.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallResult, TransportError> {
        let response: CallToolResponse = self
            .transport
            .request(
                METHOD_TOOLS_CALL,
                Some(call_tool_params(name, arguments)),
                self.request_timeout,
            )
            .await?;
        Ok(response.into())
    }

    /// Whether the server announced a tool list change since discovery.
    pub fn tools_changed(&self) -> bool {
        self.transport.tools_changed()
    }

    /// Whether the server process is still running.
    pub fn is_alive(&mut self) -> bool {
        !self.handle.has_exited()
    }

    /// Close stdin, give the server `grace` to exit, then kill it.
    pub async fn close(mut self, grace: Duration) {
        self.transport.close_input().await;
        let pid = self.handle.id();
        match self.handle.terminate(grace).await {
            Ok(()) => tracing::debug!(pid = ?pid, "Tool server connection closed"),
            Err(e) => tracing::warn!(pid = ?pid, error = %e, "Failed to terminate tool server"),
        }
    }
}

async fn initialize(
    transport: &StdioTransport,
    settings: &ClientSettings,
    request_timeout: Duration,
) -> Result<InitializeResult, TransportError> {
    let params = initialize_params(
        settings.effective_client_name(),
        settings.effective_client_version(),
    );
    let result: InitializeResult = transport
        .request(METHOD_INITIALIZE, Some(params), request_timeout)
        .await?;

    if result.protocol_version != PROTOCOL_VERSION {
        tracing::debug!(
            requested = PROTOCOL_VERSION,
            negotiated = %result.protocol_version,
            "Tool server negotiated a different protocol version"
        );
    }

    transport.notify(METHOD_INITIALIZED, None).await?;
    Ok(result)
}
