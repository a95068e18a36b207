use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::response::RequestContext;

const SENSITIVE_KEYS: [&str; 4] = ["api_key", "token", "password", "secret"];

/// Log every request and its outcome with structured fields
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let context = RequestContext::from_request(&request);
    let endpoint = sanitize_endpoint(&context.endpoint);
    let method = context.method.to_string();

    info!(
        request_id = %request_id,
        method = %method,
        endpoint = %endpoint,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        warn!(
            request_id = %request_id,
            method = %method,
            endpoint = %endpoint,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            endpoint = %endpoint,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

/// Mask values of credential-like query parameters
fn sanitize_endpoint(endpoint: &str) -> String {
    let Some((path, query)) = endpoint.split_once('?') else {
        return endpoint.to_string();
    };

    let masked: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if SENSITIVE_KEYS.contains(&key) => format!("{}=***", key),
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", path, masked.join("&"))
}
