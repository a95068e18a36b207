use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health, health_live, list_registry, not_found, openapi_json, AppState};
use super::middleware::logging_middleware;
use crate::errors::{error_handler, ErrorHandlerConfig};
use crate::metrics;
use crate::response::response_middleware;

/// Install the envelope stages on `router`.
///
/// The error handler wraps the response middleware, so every raised error
/// from a route or the fallback is answered by it.
pub fn with_envelope<S>(router: Router<S>, errors: ErrorHandlerConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(middleware::from_fn(response_middleware))
        .layer(middleware::from_fn_with_state(errors, error_handler))
}

pub fn create_router(state: AppState, errors: ErrorHandlerConfig) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(health))
        .route("/health/live", get(health_live))
        // Error registry listing
        .route("/errors/registry", get(list_registry))
        // Metrics endpoint (Prometheus)
        .route("/metrics", get(metrics::metrics_handler))
        // OpenAPI documentation
        .route("/api-docs/openapi.json", get(openapi_json))
        .fallback(not_found);

    // Order matters: trace -> logging -> error handler -> response context
    with_envelope(router, errors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
