//! Connecting sessions from parsed config lines.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{ClientInfo, ProtocolVersion};
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceExt};
use rmcp::transport::{StreamableHttpClientTransport, TokioChildProcess};
use tokio::process::Command;
use tracing::{debug, info};

use super::client::McpSession;
use super::config::{SessionSpec, SessionTransport};
use super::Session;
use crate::error::{HostError, Result};

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type McpRunningService = RunningService<RoleClient, DynClientService>;

/// Opens a live session for one config line.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self, spec: &SessionSpec) -> Result<Arc<dyn Session>>;
}

/// Connects real MCP servers through rmcp.
#[derive(Debug, Clone, Copy, Default)]
pub struct McpConnector;

impl McpConnector {
    pub fn new() -> Self {
        Self
    }

    async fn open(
        spec: &SessionSpec,
        client_info: ClientInfo,
    ) -> std::result::Result<McpRunningService, ClientInitializeError> {
        match &spec.transport {
            SessionTransport::Stdio { dir, command, args } => {
                let mut process = Command::new(command);
                process.args(args).current_dir(dir).kill_on_drop(true);
                let transport = TokioChildProcess::new(process).map_err(|error| {
                    ClientInitializeError::transport::<TokioChildProcess>(
                        error,
                        "spawn stdio transport",
                    )
                })?;
                client_info.into_dyn().serve(transport).await
            }
            SessionTransport::Http { url } => {
                let transport = StreamableHttpClientTransport::from_uri(url.clone());
                client_info.into_dyn().serve(transport).await
            }
        }
    }

    /// Handshake with the latest protocol version, retrying once with the
    /// 2024-11-05 revision when the server rejects the version.
    async fn open_with_protocol_fallback(spec: &SessionSpec) -> Result<McpRunningService> {
        let latest = ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };

        match Self::open(spec, latest).await {
            Ok(service) => return Ok(service),
            Err(error) if should_retry_protocol_fallback(&error) => {
                debug!(server = %spec.name, "retrying MCP handshake with legacy protocol");
            }
            Err(error) => return Err(map_client_initialize_error(&spec.name, error)),
        }

        let legacy = ClientInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            ..Default::default()
        };
        Self::open(spec, legacy)
            .await
            .map_err(|error| map_client_initialize_error(&spec.name, error))
    }
}

#[async_trait]
impl SessionConnector for McpConnector {
    async fn connect(&self, spec: &SessionSpec) -> Result<Arc<dyn Session>> {
        let service = Self::open_with_protocol_fallback(spec).await?;
        let session = McpSession::new(spec.name.clone(), service);
        info!(
            server = %spec.name,
            transport = spec.kind(),
            tools = session.supports_tools(),
            "MCP session connected"
        );
        Ok(Arc::new(session))
    }
}

fn should_retry_protocol_fallback(error: &ClientInitializeError) -> bool {
    match error {
        ClientInitializeError::JsonRpcError(error) => {
            let message = error.message.to_ascii_lowercase();
            message.contains("protocol") && message.contains("version")
        }
        _ => false,
    }
}

pub(crate) fn map_client_initialize_error(server: &str, error: ClientInitializeError) -> HostError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            HostError::session(server, format!("connection closed during initialize: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => {
            HostError::session(server, format!("transport error ({context}): {error}"))
        }
        ClientInitializeError::JsonRpcError(error) => HostError::session(
            server,
            format!("initialize JSON-RPC error {}: {}", error.code.0, error.message),
        ),
        ClientInitializeError::Cancelled => HostError::session(server, "initialize cancelled"),
        other => HostError::session(server, format!("initialize error: {other}")),
    }
}
