use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ApiError;
use crate::host::{GenerateOptions, Host};
use crate::types::{Message, ToolDescriptor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerList {
    pub servers: Vec<ServerEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolList {
    pub tools: Vec<ToolDescriptor>,
}

/// Body of `POST /generations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub message: Message,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn list_servers(State(host): State<Arc<Host>>) -> Json<ServerList> {
    let servers = host
        .server_names()
        .into_iter()
        .map(|name| ServerEntry { name })
        .collect();
    Json(ServerList { servers })
}

pub async fn list_server_tools(
    State(host): State<Arc<Host>>,
    Path(name): Path<String>,
) -> Result<Json<ToolList>, ApiError> {
    let tools = host.server_tools(&name).await?;
    Ok(Json(ToolList { tools }))
}

pub async fn create_generation(
    State(host): State<Arc<Host>>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        let status = match rejection {
            JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::new(status, rejection.body_text())
    })?;

    let message = host
        .generate(&request.messages, request.options)
        .await
        .map_err(|error| {
            warn!(
                %error,
                routing = error.is_routing_failure(),
                retryable = error.is_retryable(),
                "generation failed"
            );
            ApiError::from(error)
        })?;
    Ok(Json(GenerationResponse { message }))
}
