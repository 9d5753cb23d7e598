//! Error types for the host.

pub mod unified;

pub use unified::ErrorCategory;

use thiserror::Error;

use crate::types::ToolId;

/// Primary error type for all host operations.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown server: {0}")]
    UnknownServer(String),

    #[error("Tool not permitted: {0}")]
    ToolNotPermitted(ToolId),

    #[error("Invalid tool name: {0}")]
    InvalidToolName(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tool execution error: {tool} - {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Session error ({server}): {message}")]
    Session { server: String, message: String },

    #[error("Backend error: {backend} - {message}")]
    Backend { backend: String, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HostError {
    pub fn session(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Session {
            server: server.into(),
            message: message.into(),
        }
    }

    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::UnknownServer(_) => ErrorCategory::NotFound,
            Self::ToolNotPermitted(_) | Self::InvalidToolName(_) | Self::InvalidArgument(_) => {
                ErrorCategory::Routing
            }
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            Self::Session { .. } => ErrorCategory::Session,
            Self::Backend { .. } | Self::Api { .. } | Self::Network(_) => ErrorCategory::Backend,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Network(_) | Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// Whether the router must abort the agent step rather than report the
    /// failure back to the model as content.
    pub fn is_routing_failure(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::NotFound | ErrorCategory::Routing
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, HostError>;
