//! Error classification shared by the router, the agent loop, and the HTTP façade.

use axum::http::StatusCode;

/// Broad error category used to decide propagation and HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad config line, duplicate server name, invalid settings.
    Configuration,
    /// A name that resolves to nothing (unknown server).
    NotFound,
    /// Policy or routing failure: disallowed tool, malformed tool name, bad input.
    Routing,
    /// A tool call itself failed. Recovered into conversation content.
    ToolExecution,
    /// The session transport or protocol failed.
    Session,
    /// The model backend failed.
    Backend,
    Timeout,
    /// Encoding or decoding inside the host. Request bodies are rejected
    /// before they reach this point.
    Serialization,
    Internal,
}

impl ErrorCategory {
    /// HTTP status the façade reports for this category.
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Routing => StatusCode::BAD_REQUEST,
            Self::Backend | Self::Session | Self::ToolExecution => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Configuration | Self::Serialization | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
