use axum::{extract::State, http::Uri, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

use super::openapi::ApiDoc;
use crate::errors::{registry, AppError, ErrorKind, HandlerResult};
use crate::response::Responder;

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub instance_id: String,
}

/// One row of the error registry
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistryListing {
    /// Error kind
    pub kind: ErrorKind,
    /// Public message sent to clients
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// HTTP status
    pub status: u16,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = serde_json::Value)
    )
)]
pub async fn health(State(state): State<AppState>, responder: Responder) -> impl IntoResponse {
    responder.data(json!({
        "status": "healthy",
        "service": "response-envelope",
        "version": env!("CARGO_PKG_VERSION"),
        "instance_id": state.instance_id,
        "uptime_seconds": START_TIME.elapsed().as_secs(),
    }))
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Process is alive", body = serde_json::Value)
    )
)]
pub async fn health_live(State(state): State<AppState>, responder: Responder) -> impl IntoResponse {
    responder.data(json!({
        "status": "alive",
        "instance_id": state.instance_id,
    }))
}

/// List the mapped error kinds and their public presentation
#[utoipa::path(
    get,
    path = "/errors/registry",
    tag = "errors",
    responses(
        (status = 200, description = "Registered error mappings", body = serde_json::Value)
    )
)]
pub async fn list_registry(responder: Responder) -> impl IntoResponse {
    let listings: Vec<RegistryListing> = registry::entries()
        .map(|(kind, entry)| RegistryListing {
            kind,
            message: entry.message.to_string(),
            code: entry.code.to_string(),
            status: entry.status,
        })
        .collect();

    info!("Registry listing: {} entries", listings.len());
    responder.data(listings)
}

/// OpenAPI document
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> HandlerResult {
    Err(AppError::not_found(format!("No route matches {}", uri.path())).into())
}
