use std::time::Instant;

use axum::extract::Request;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};
use uuid::Uuid;

use super::ApiError;

/// Reject requests that cannot exchange JSON.
///
/// An `Accept` header, when present, must admit `application/json`; POST
/// bodies must be declared `application/json`.
pub async fn negotiate_json(request: Request, next: Next) -> Response {
    if !accepts_json(request.headers()) {
        warn!(path = %request.uri().path(), "rejected request: response must be JSON");
        return ApiError::new(StatusCode::NOT_ACCEPTABLE, "Accept must allow application/json")
            .into_response();
    }
    if request.method() == Method::POST && !is_json_body(request.headers()) {
        warn!(path = %request.uri().path(), "rejected request: body must be JSON");
        return ApiError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Content-Type must be application/json",
        )
        .into_response();
    }
    next.run(request).await
}

/// Log each request with a generated id, its status, and latency.
pub async fn trace_requests(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %request_id,
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    response
}

fn accepts_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(ACCEPT) else {
        return true;
    };
    let accept = accept.to_str().unwrap_or_default();
    accept.split(',').any(|range| {
        let media = range.split(';').next().unwrap_or_default().trim();
        matches!(media, "application/json" | "application/*" | "*/*")
    })
}

fn is_json_body(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|media| media.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}
