//! Convenience re-exports for common use.

pub use crate::agent::{Agent, AgentLoop, EchoAgent};
pub use crate::catalog::ToolCatalog;
pub use crate::config::HostSettings;
pub use crate::error::{HostError, Result};
pub use crate::host::{GenerateOptions, Host};
pub use crate::mcp::{McpConnector, Session, SessionConnector};
pub use crate::registry::SessionRegistry;
pub use crate::router::{HostToolRouter, NullToolRouter, ToolRouter};
pub use crate::types::{Message, Part, Role, ToolConfig, ToolId, ToolPatch, ToolUsePart};
