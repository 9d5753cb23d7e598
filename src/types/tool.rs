//! Tool identity, descriptors, and per-request tool configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// JSON object used for tool arguments and schemas.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Globally unique identity of a tool: the owning server plus the server-local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolId {
    pub server_name: String,
    pub name: String,
}

impl ToolId {
    /// Separator between server name and tool name in the composite form.
    pub const SEPARATOR: char = '.';

    pub fn new(server_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            name: name.into(),
        }
    }

    /// Composite string form, `server.tool`.
    pub fn compose(&self) -> String {
        format!("{}{}{}", self.server_name, Self::SEPARATOR, self.name)
    }

    /// Parse a composite name back into its parts.
    ///
    /// Fails unless the input holds exactly one separator with a non-empty
    /// segment on each side, so names that embed the separator never mis-split.
    pub fn decompose(composite: &str) -> Result<Self, HostError> {
        let mut segments = composite.split(Self::SEPARATOR);
        match (segments.next(), segments.next(), segments.next()) {
            (Some(server), Some(name), None) if !server.is_empty() && !name.is_empty() => {
                Ok(Self::new(server, name))
            }
            _ => Err(HostError::InvalidToolName(composite.to_string())),
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compose())
    }
}

/// Protocol-level description of one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
}

/// A tool descriptor tagged with the server that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTool {
    pub server_name: String,
    #[serde(flatten)]
    pub tool: ToolDescriptor,
}

impl ServerTool {
    pub fn new(server_name: impl Into<String>, tool: ToolDescriptor) -> Self {
        Self {
            server_name: server_name.into(),
            tool,
        }
    }

    pub fn id(&self) -> ToolId {
        ToolId::new(self.server_name.clone(), self.tool.name.clone())
    }

    pub fn matches(&self, id: &ToolId) -> bool {
        self.server_name == id.server_name && self.tool.name == id.name
    }
}

/// Fixed input values pinned onto every invocation of a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolPatch {
    #[serde(default)]
    pub input: JsonObject,
}

impl ToolPatch {
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

/// Per-request override for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub tool_id: ToolId,
    #[serde(default)]
    pub tool_patch: ToolPatch,
}

impl ToolConfig {
    pub fn allow(tool_id: ToolId) -> Self {
        Self {
            tool_id,
            tool_patch: ToolPatch::default(),
        }
    }

    pub fn patched(tool_id: ToolId, input: JsonObject) -> Self {
        Self {
            tool_id,
            tool_patch: ToolPatch { input },
        }
    }
}
