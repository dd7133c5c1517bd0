//! MCP wire types.
//!
//! JSON-RPC 2.0 envelopes and the MCP payloads the client exchanges with a
//! tool server. Reference: <https://spec.modelcontextprotocol.io/>

use focusdesk_core::{ToolCallResult, ToolContent, ToolDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Protocol revision requested in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";
pub const METHOD_PING: &str = "ping";
pub const NOTIFICATION_TOOLS_CHANGED: &str = "notifications/tools/list_changed";

/// JSON-RPC "method not found".
pub const METHOD_NOT_FOUND: i64 = -32601;

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl<'a> JsonRpcRequest<'a> {
    pub const fn new(id: u64, method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 notification (no id, no response).
#[derive(Debug, Serialize)]
pub struct JsonRpcNotification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl<'a> JsonRpcNotification<'a> {
    pub const fn new(method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Any message read from the server.
///
/// Servers send responses to our requests, but may also send their own
/// requests (`ping`) and notifications, so the envelope is parsed loosely and
/// classified with [`IncomingMessage::kind`].
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// Classification of an [`IncomingMessage`].
#[derive(Debug, PartialEq)]
pub enum MessageKind<'a> {
    /// Reply to one of our requests.
    Response { id: Option<u64> },
    /// Server-initiated request that needs a reply.
    Request { id: &'a Value, method: &'a str },
    /// Server notification.
    Notification { method: &'a str },
}

impl IncomingMessage {
    pub fn kind(&self) -> MessageKind<'_> {
        match (&self.id, self.method.as_deref()) {
            (Some(id), Some(method)) => MessageKind::Request { id, method },
            (None, Some(method)) => MessageKind::Notification { method },
            (id, None) => MessageKind::Response {
                id: id.as_ref().and_then(Value::as_u64),
            },
        }
    }
}

/// Build a reply to a server-initiated request.
pub fn response_line(id: &Value, outcome: Result<Value, JsonRpcError>) -> Value {
    match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(error) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
    }
}

/// Parameters of the `initialize` request.
pub fn initialize_params(client_name: &str, client_version: &str) -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "clientInfo": {
            "name": client_name,
            "version": client_version
        },
        "capabilities": {}
    })
}

/// MCP initialize result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub server_info: ServerInfo,
    #[serde(default)]
    pub capabilities: ServerCapabilities,
}

/// Server information from initialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Server capabilities.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerCapabilities {
    #[serde(default)]
    pub tools: Option<ToolsCapability>,
}

/// Tools capability.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    #[serde(default)]
    pub list_changed: Option<bool>,
}

impl ServerCapabilities {
    pub const fn supports_tools(&self) -> bool {
        self.tools.is_some()
    }
}

/// One page of `tools/list`.
///
/// Entries are kept as raw JSON so one malformed tool cannot fail the page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsPage {
    #[serde(default)]
    pub tools: Vec<Value>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Parameters of a `tools/list` request.
pub fn list_tools_params(cursor: Option<&str>) -> Option<Value> {
    cursor.map(|cursor| json!({ "cursor": cursor }))
}

/// Wire shape of an advertised tool; unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdvertisedTool {
    name: String,
    #[serde(default)]
    description: Option<String>,
    input_schema: Value,
}

/// Validate one raw `tools/list` entry and project it to a descriptor.
///
/// Returns `None` for entries without a non-empty string `name` or without
/// an object `inputSchema`.
pub fn project_tool(raw: Value) -> Option<ToolDescriptor> {
    let tool: AdvertisedTool = match serde_json::from_value(raw) {
        Ok(tool) => tool,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed tool entry");
            return None;
        }
    };

    if tool.name.trim().is_empty() {
        tracing::warn!("Ignoring tool entry with empty name");
        return None;
    }

    if !tool.input_schema.is_object() {
        tracing::warn!(tool = %tool.name, "Ignoring tool whose inputSchema is not an object");
        return None;
    }

    Some(ToolDescriptor {
        name: tool.name,
        description: tool.description,
        input_schema: tool.input_schema,
    })
}

/// Parameters of a `tools/call` request.
pub fn call_tool_params(name: &str, arguments: Map<String, Value>) -> Value {
    json!({
        "name": name,
        "arguments": arguments
    })
}

/// Wire shape of a `tools/call` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResponse {
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(default)]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub is_error: Option<bool>,
}

impl From<CallToolResponse> for ToolCallResult {
    fn from(response: CallToolResponse) -> Self {
        Self {
            content: response.content.into_iter().map(ToolContent::from).collect(),
            structured_content: response.structured_content,
            is_error: response.is_error.unwrap_or(false),
        }
    }
}
