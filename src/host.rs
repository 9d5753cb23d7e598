//! Top-level façade: registry plus agent, answering one generation at a time.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::{Agent, AgentLoop};
use crate::catalog::ToolCatalog;
use crate::config::HostSettings;
use crate::error::{HostError, Result};
use crate::mcp::SessionConnector;
use crate::registry::SessionRegistry;
use crate::router::{HostToolRouter, RouterPolicy};
use crate::types::{Message, Role, ToolConfig, ToolDescriptor};

/// Per-request tool scoping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
    #[serde(default)]
    pub tool_configs: Vec<ToolConfig>,
    #[serde(default, rename = "onlyIncludeConfiguredTools")]
    pub only_configured_tools: bool,
}

impl From<GenerateOptions> for RouterPolicy {
    fn from(options: GenerateOptions) -> Self {
        Self {
            tool_configs: options.tool_configs,
            only_configured_tools: options.only_configured_tools,
        }
    }
}

/// Owns the session registry and the configured agent.
///
/// Requests share nothing mutable; each builds its own router.
#[derive(Clone)]
pub struct Host {
    catalog: ToolCatalog,
    agent: Arc<dyn Agent>,
    rounds: AgentLoop,
    request_timeout: Option<Duration>,
}

impl Host {
    pub fn new(registry: SessionRegistry, agent: Arc<dyn Agent>) -> Self {
        Self {
            catalog: ToolCatalog::new(Arc::new(registry)),
            agent,
            rounds: AgentLoop::default(),
            request_timeout: None,
        }
    }

    /// Build the registry from the settings' servers file and the agent from
    /// its backend settings.
    pub async fn from_settings(
        settings: &HostSettings,
        connector: &dyn SessionConnector,
    ) -> Result<Self> {
        settings.validate()?;
        let registry = SessionRegistry::build(&settings.read_servers()?, connector).await?;
        let agent = settings.backend.build_agent()?;
        info!(
            servers = registry.len(),
            backend = agent.name(),
            max_rounds = settings.max_rounds,
            "host ready"
        );
        Ok(Self::new(registry, agent)
            .with_max_rounds(settings.max_rounds)?
            .with_request_timeout(settings.request_timeout()))
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Result<Self> {
        self.rounds = AgentLoop::new(max_rounds)?;
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        self.catalog.registry()
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Registered server names in ascending order.
    pub fn server_names(&self) -> Vec<String> {
        self.registry().list_names()
    }

    pub async fn server_tools(&self, name: &str) -> Result<Vec<ToolDescriptor>> {
        self.catalog.server_tools(name).await
    }

    /// Router scoped to one request.
    pub fn router(&self, options: GenerateOptions) -> HostToolRouter {
        HostToolRouter::new(self.catalog.clone(), options.into())
    }

    /// Run one turn and return the model's reply. The caller's history is
    /// read, never modified.
    pub async fn generate(&self, history: &[Message], options: GenerateOptions) -> Result<Message> {
        match history.last() {
            None => return Err(HostError::InvalidArgument("history is empty".into())),
            Some(last) if last.role != Role::User => {
                return Err(HostError::InvalidArgument(
                    "history must end with a user message".into(),
                ))
            }
            Some(_) => {}
        }

        let router = self.router(options);
        debug!(
            messages = history.len(),
            tool_configs = router.policy().tool_configs.len(),
            only_configured = router.policy().only_configured_tools,
            "generation started"
        );
        let turn = self.rounds.run(self.agent.as_ref(), &router, history);
        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, turn)
                .await
                .map_err(|_| HostError::Timeout(limit.as_millis() as u64))?,
            None => turn.await,
        }
    }

    /// Close every session.
    pub async fn shutdown(&self) {
        self.registry().close_all().await;
    }
}
