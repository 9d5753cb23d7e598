//! Sessions with Model Context Protocol (MCP) tool servers.

pub mod client;
pub mod config;
pub mod transport;

pub use client::McpSession;
pub use config::{parse_config, parse_line, SessionSpec, SessionTransport};
pub use transport::{McpConnector, SessionConnector};

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{HostError, Result};
use crate::types::{JsonObject, ToolCallOutput, ToolDescriptor};

/// One page of a server's tool listing.
#[derive(Debug, Clone, Default)]
pub struct ToolPage {
    pub tools: Vec<ToolDescriptor>,
    pub next_cursor: Option<String>,
}

/// A live, named connection to one tool server.
///
/// Implementations serialize their own protocol traffic; independent sessions
/// never block each other.
#[async_trait]
pub trait Session: Send + Sync {
    /// Registry name of this session.
    fn name(&self) -> &str;

    /// Whether the server advertised tool support during the handshake.
    fn supports_tools(&self) -> bool;

    /// Fetch one page of tools starting at `cursor`.
    async fn list_tools(&self, cursor: Option<String>) -> Result<ToolPage>;

    /// Invoke a tool by its server-local name.
    async fn call_tool(&self, name: &str, arguments: Option<JsonObject>)
        -> Result<ToolCallOutput>;

    /// Tear the session down. Calling it more than once is harmless.
    async fn close(&self) -> Result<()>;
}

/// List every tool on a session, following cursors until the server stops
/// returning one. Servers without tool support list nothing.
pub async fn list_all_tools(session: &dyn Session) -> Result<Vec<ToolDescriptor>> {
    if !session.supports_tools() {
        debug!(server = session.name(), "server has no tools capability");
        return Ok(Vec::new());
    }

    let mut tools = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = session.list_tools(cursor.clone()).await?;
        tools.extend(page.tools);
        match page.next_cursor {
            None => break,
            Some(next) if !seen.insert(next.clone()) => {
                return Err(HostError::session(
                    session.name(),
                    format!("tool listing repeated cursor '{next}'"),
                ));
            }
            Some(next) => cursor = Some(next),
        }
    }
    Ok(tools)
}
