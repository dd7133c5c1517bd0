//! Tool descriptors, the per-connection tool directory, and call results.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Tool advertised by a tool server.
///
/// Only the name, description and input schema survive discovery; any other
/// metadata the server attaches is discarded at the protocol boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within a directory.
    pub name: String,

    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema object for the tool arguments.
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Create a descriptor with no description.
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Ordered snapshot of the tools exposed by one connection.
///
/// A directory is never edited in place: each discovery round builds a new
/// one and the client swaps it in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolDirectory {
    tools: Vec<ToolDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    discovered_at: Option<DateTime<Utc>>,
}

impl ToolDirectory {
    /// The empty directory of a client that has never connected.
    pub const fn empty() -> Self {
        Self {
            tools: Vec::new(),
            discovered_at: None,
        }
    }

    /// Build a directory from tools in the order the server advertised them.
    ///
    /// When a name repeats, the first occurrence wins.
    pub fn from_advertised(tools: impl IntoIterator<Item = ToolDescriptor>) -> Self {
        let mut seen = HashSet::new();
        let tools = tools
            .into_iter()
            .filter(|tool| {
                let fresh = seen.insert(tool.name.clone());
                if !fresh {
                    tracing::warn!(tool = %tool.name, "Dropping duplicate tool name");
                }
                fresh
            })
            .collect();

        Self {
            tools,
            discovered_at: Some(Utc::now()),
        }
    }

    /// All tools, in advertised order.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Look a tool up by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Tool names, in advertised order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// When the discovery round that produced this directory completed.
    pub const fn discovered_at(&self) -> Option<DateTime<Utc>> {
        self.discovered_at
    }
}

/// One content item of a tool result.
///
/// Serialized in the MCP wire shape (`{"type": "text", ...}`), so a value
/// read back through serde classifies the same way as one parsed off the
/// wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ToolContent {
    /// Plain text.
    Text { text: String },
    /// Base64-encoded image.
    Image { data: String, mime_type: String },
    /// Any other content kind, kept as the raw JSON the server sent.
    Other(Value),
}

impl From<Value> for ToolContent {
    fn from(value: Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str);
        match kind {
            Some("text") => match value.get("text").and_then(Value::as_str) {
                Some(text) => Self::Text {
                    text: text.to_string(),
                },
                None => Self::Other(value),
            },
            Some("image") => {
                let data = value.get("data").and_then(Value::as_str);
                let mime_type = value.get("mimeType").and_then(Value::as_str);
                match (data, mime_type) {
                    (Some(data), Some(mime_type)) => Self::Image {
                        data: data.to_string(),
                        mime_type: mime_type.to_string(),
                    },
                    _ => Self::Other(value),
                }
            }
            _ => Self::Other(value),
        }
    }
}

impl From<ToolContent> for Value {
    fn from(content: ToolContent) -> Self {
        match content {
            ToolContent::Text { text } => json!({"type": "text", "text": text}),
            ToolContent::Image { data, mime_type } => {
                json!({"type": "image", "data": data, "mimeType": mime_type})
            }
            ToolContent::Other(value) => value,
        }
    }
}

/// Result of a tool call.
///
/// `is_error` reports a failure inside the tool itself; protocol and
/// transport failures never produce a `ToolCallResult`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Content items, in the order the server returned them.
    pub content: Vec<ToolContent>,

    /// Structured output, when the tool declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,

    /// Whether the tool reported a failure.
    pub is_error: bool,
}

impl ToolCallResult {
    /// Concatenate all text items, one per line.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                ToolContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
