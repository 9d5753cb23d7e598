//! Read-through view of every tool exposed by the registered sessions.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::TryStreamExt;

use crate::error::Result;
use crate::mcp::list_all_tools;
use crate::registry::SessionRegistry;
use crate::types::{ServerTool, ToolDescriptor};

/// Lists and flattens tools across sessions, tagging each with its server.
#[derive(Clone)]
pub struct ToolCatalog {
    registry: Arc<SessionRegistry>,
}

impl ToolCatalog {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Lazily list every tool, server by server in name order.
    ///
    /// A server whose listing fails ends the stream with that error; tools
    /// already yielded stay valid but later servers are not listed.
    pub fn all_tools(&self) -> BoxStream<'static, Result<ServerTool>> {
        let registry = Arc::clone(&self.registry);
        Box::pin(async_stream::try_stream! {
            for (name, session) in registry.iter() {
                let tools = list_all_tools(session.as_ref()).await?;
                for tool in tools {
                    yield ServerTool::new(name, tool);
                }
            }
        })
    }

    /// Collect [`Self::all_tools`], failing on the first error.
    pub async fn collect(&self) -> Result<Vec<ServerTool>> {
        self.all_tools().try_collect().await
    }

    /// Tools of one server. Unknown names fail; servers without tool support list nothing.
    pub async fn server_tools(&self, name: &str) -> Result<Vec<ToolDescriptor>> {
        let session = self.registry.get(name)?;
        list_all_tools(session.as_ref()).await
    }
}
