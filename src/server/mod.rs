//! HTTP façade over a [`Host`].
//!
//! | Route                       | Response                  |
//! |-----------------------------|---------------------------|
//! | `GET /health`               | `{"status":"ok"}`         |
//! | `GET /servers`              | `{"servers":[{"name"}]}`  |
//! | `GET /servers/{name}/tools` | `{"tools":[...]}`         |
//! | `POST /generations`         | `{"message":{...}}`       |
//!
//! Failures answer `{"error": "..."}` with a 4xx/5xx status.

pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{HostError, Result};
use crate::host::Host;

/// Build the axum router for `host`.
pub fn router(host: Arc<Host>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/servers", get(handlers::list_servers))
        .route("/servers/{name}/tools", get(handlers::list_server_tools))
        .route("/generations", post(handlers::create_generation))
        .layer(axum::middleware::from_fn(middleware::negotiate_json))
        .layer(axum::middleware::from_fn(middleware::trace_requests))
        .with_state(host)
}

/// Serve until `shutdown` is cancelled, then close every session.
pub async fn serve(host: Arc<Host>, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, servers = host.server_names().len(), "HTTP server listening");

    axum::serve(listener, router(Arc::clone(&host)))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("HTTP server stopped; closing sessions");
    host.shutdown().await;
    Ok(())
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An error answered as `{"error": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<HostError> for ApiError {
    fn from(error: HostError) -> Self {
        Self::new(error.category().status_code(), error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
