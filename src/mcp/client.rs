//! rmcp-backed [`Session`].

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, Content, ResourceContents};
use rmcp::service::ServiceError;
use tokio::sync::Mutex;
use tracing::debug;

use super::transport::McpRunningService;
use super::{Session, ToolPage};
use crate::error::{HostError, Result};
use crate::types::{JsonObject, ToolCallOutput, ToolDescriptor};

/// A session over a running rmcp client service.
///
/// Requests are serialized through a mutex so one call is in flight at a time.
pub struct McpSession {
    name: String,
    supports_tools: bool,
    service: Mutex<Option<McpRunningService>>,
}

impl McpSession {
    pub fn new(name: impl Into<String>, service: McpRunningService) -> Self {
        // Without handshake metadata, assume tools and let listing decide.
        let supports_tools = service
            .peer_info()
            .map(|info| info.capabilities.tools.is_some())
            .unwrap_or(true);
        Self {
            name: name.into(),
            supports_tools,
            service: Mutex::new(Some(service)),
        }
    }

    fn closed(&self) -> HostError {
        HostError::session(&self.name, "session is closed")
    }
}

#[async_trait]
impl Session for McpSession {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_tools(&self) -> bool {
        self.supports_tools
    }

    async fn list_tools(&self, cursor: Option<String>) -> Result<ToolPage> {
        let guard = self.service.lock().await;
        let service = guard.as_ref().ok_or_else(|| self.closed())?;

        let params = match cursor {
            Some(cursor) => Some(serde_json::from_value(serde_json::json!({ "cursor": cursor }))?),
            None => None,
        };
        let page = service
            .list_tools(params)
            .await
            .map_err(|error| map_service_error(&self.name, "list_tools", error))?;

        debug!(server = %self.name, count = page.tools.len(), "listed MCP tools page");
        Ok(ToolPage {
            tools: page.tools.into_iter().map(map_tool_descriptor).collect(),
            next_cursor: page.next_cursor,
        })
    }

    async fn call_tool(&self, name: &str, arguments: Option<JsonObject>) -> Result<ToolCallOutput> {
        let guard = self.service.lock().await;
        let service = guard.as_ref().ok_or_else(|| self.closed())?;

        let result = service
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|error| map_service_error(&self.name, "call_tool", error))?;

        map_call_result(name, result)
    }

    async fn close(&self) -> Result<()> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };
        service
            .cancel()
            .await
            .map_err(|error| HostError::session(&self.name, format!("close failed: {error}")))?;
        debug!(server = %self.name, "MCP session closed");
        Ok(())
    }
}

fn map_tool_descriptor(tool: rmcp::model::Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
        output_schema: tool
            .output_schema
            .map(|schema| serde_json::Value::Object((*schema).clone())),
    }
}

fn extract_text_content(content: &[Content]) -> Option<String> {
    let mut lines = Vec::new();
    for item in content {
        if let Some(text) = item.as_text() {
            lines.push(text.text.clone());
            continue;
        }
        if let Some(resource) = item.as_resource() {
            if let ResourceContents::TextResourceContents { text, .. } = &resource.resource {
                lines.push(text.clone());
            }
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn map_call_result(name: &str, result: CallToolResult) -> Result<ToolCallOutput> {
    let text = extract_text_content(&result.content);

    if result.is_error.unwrap_or(false) {
        let message = result
            .structured_content
            .as_ref()
            .map(|v| v.to_string())
            .or(text)
            .unwrap_or_else(|| "tool returned an error result".into());
        return Err(HostError::ToolExecution {
            tool: name.to_string(),
            message,
        });
    }

    Ok(ToolCallOutput {
        structured_content: result.structured_content,
        text,
        content: result
            .content
            .iter()
            .filter_map(|item| serde_json::to_value(item).ok())
            .collect(),
    })
}

fn map_service_error(server: &str, operation: &str, error: ServiceError) -> HostError {
    match error {
        ServiceError::McpError(error) => HostError::session(
            server,
            format!("{operation}: MCP error {}: {}", error.code.0, error.message),
        ),
        ServiceError::TransportSend(error) => {
            HostError::session(server, format!("{operation}: transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            HostError::session(server, format!("{operation}: transport closed"))
        }
        ServiceError::UnexpectedResponse => {
            HostError::session(server, format!("{operation}: unexpected response"))
        }
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            HostError::session(server, format!("{operation}: request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => HostError::Timeout(timeout.as_millis() as u64),
        other => HostError::session(server, format!("{operation}: {other}")),
    }
}
