//! HTTP request handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::invocation::REQUEST_ID_HEADER;
use gateway_core::{InvocationEvent, InvocationResponse};
use serde::Serialize;
use tracing::instrument;

use crate::{extractors::RequestId, state::AppState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// Liveness check endpoint
pub async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.gateway.metrics() {
        Some(metrics) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            metrics.gather(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// Prompt endpoint.
///
/// The raw body is handed to the pipeline as JSON text; an empty body counts
/// as no body.
#[instrument(skip(state, body), fields(request_id = %request_id))]
pub async fn prompt(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    body: Bytes,
) -> Response {
    let event = InvocationEvent::from_http_body(&body).with_header(REQUEST_ID_HEADER, &request_id);
    let reply = state.gateway.handle(&event).await;
    into_http_response(reply, &request_id)
}

/// Map an [`InvocationResponse`] onto an HTTP response
fn into_http_response(reply: InvocationResponse, request_id: &str) -> Response {
    let status =
        StatusCode::from_u16(reply.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response();

    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
