//! Per-request tool routing handed to an agent.
//!
//! [`HostToolRouter`] scopes the catalog to one request: it decides which
//! tools are visible, pins patched inputs, and dispatches calls to the owning
//! session. [`NullToolRouter`] exposes nothing and is used to force the last
//! round of a turn to answer in text.

pub mod patch;

pub use patch::coerce_arguments;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::ToolCatalog;
use crate::error::{HostError, Result};
use crate::types::{ServerTool, ToolConfig, ToolId, ToolUsePart};

/// Tool access granted to an agent for one round.
///
/// `call_tool` fails only for routing or policy problems. A tool that runs and
/// fails is reported as a [`ToolUsePart`] carrying the error.
#[async_trait]
pub trait ToolRouter: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ServerTool>>;

    async fn call_tool(&self, tool_id: &ToolId, arguments: Value) -> Result<ToolUsePart>;
}

/// Visibility and overlay policy for one request.
#[derive(Debug, Clone, Default)]
pub struct RouterPolicy {
    pub tool_configs: Vec<ToolConfig>,
    /// Hide every tool that no config names.
    pub only_configured_tools: bool,
}

impl RouterPolicy {
    /// The config for `tool_id`. Any config counts as permission, patch or not.
    pub fn config_for(&self, tool_id: &ToolId) -> Option<&ToolConfig> {
        self.tool_configs
            .iter()
            .find(|config| config.tool_id == *tool_id)
    }
}

/// Router over the host's sessions, scoped by a [`RouterPolicy`].
#[derive(Clone)]
pub struct HostToolRouter {
    catalog: ToolCatalog,
    policy: RouterPolicy,
}

impl HostToolRouter {
    pub fn new(catalog: ToolCatalog, policy: RouterPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn policy(&self) -> &RouterPolicy {
        &self.policy
    }
}

#[async_trait]
impl ToolRouter for HostToolRouter {
    async fn list_tools(&self) -> Result<Vec<ServerTool>> {
        let all = self.catalog.collect().await?;
        let visible = all
            .into_iter()
            .filter_map(|mut tool| match self.policy.config_for(&tool.id()) {
                Some(config) => {
                    config.tool_patch.redact_schema(&mut tool.tool.input_schema);
                    Some(tool)
                }
                None if self.policy.only_configured_tools => None,
                None => Some(tool),
            })
            .collect::<Vec<_>>();
        debug!(visible = visible.len(), "router listed tools");
        Ok(visible)
    }

    async fn call_tool(&self, tool_id: &ToolId, arguments: Value) -> Result<ToolUsePart> {
        let config = self.policy.config_for(tool_id);
        if config.is_none() && self.policy.only_configured_tools {
            warn!(tool = %tool_id, "tool call rejected by policy");
            return Err(HostError::ToolNotPermitted(tool_id.clone()));
        }
        let session = self.catalog.registry().get(&tool_id.server_name)?;

        let patched = match config {
            Some(config) => config.tool_patch.apply(arguments.clone()),
            None => coerce_arguments(arguments.clone()),
        };
        let patched = match patched {
            Ok(patched) => patched,
            Err(error) => return Ok(ToolUsePart::failed(tool_id.clone(), arguments, error.to_string())),
        };
        let input = patched.clone().map(Value::Object).unwrap_or(Value::Null);

        match session.call_tool(&tool_id.name, patched).await {
            Ok(output) => {
                info!(server = %tool_id.server_name, tool = %tool_id.name, "tool call succeeded");
                Ok(ToolUsePart::succeeded(tool_id.clone(), input, output))
            }
            Err(error) => {
                warn!(server = %tool_id.server_name, tool = %tool_id.name, %error, "tool call failed");
                Ok(ToolUsePart::failed(tool_id.clone(), input, error.to_string()))
            }
        }
    }
}

/// Router with no tools; every call is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullToolRouter;

#[async_trait]
impl ToolRouter for NullToolRouter {
    async fn list_tools(&self) -> Result<Vec<ServerTool>> {
        Ok(Vec::new())
    }

    async fn call_tool(&self, tool_id: &ToolId, _arguments: Value) -> Result<ToolUsePart> {
        Err(HostError::ToolNotPermitted(tool_id.clone()))
    }
}
