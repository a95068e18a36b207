pub mod registry;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};

use crate::errors::handler::INTERNAL_ERROR_CODE;
use crate::errors::registry as error_registry;
use crate::response::envelope::DEFAULT_ERROR_CODE;
use crate::response::Responder;

/// Label for codes outside the fixed set, keeping label cardinality bounded
pub const CUSTOM_CODE_LABEL: &str = "CUSTOM";

pub use registry::{init_metrics, HTTP_ENVELOPES_TOTAL, UNHANDLED_ERRORS_TOTAL};

/// Count an emitted envelope
pub fn record_envelope(kind: &str, code: &str, status: StatusCode) {
    HTTP_ENVELOPES_TOTAL
        .with_label_values(&[kind, code_label(code), status.as_str()])
        .inc();
}

/// Registry codes and the built-in ones pass through; anything a caller
/// picked with `ErrorReply::code` is counted as [`CUSTOM_CODE_LABEL`].
fn code_label(code: &str) -> &str {
    let known = code == "OK"
        || code == DEFAULT_ERROR_CODE
        || code == INTERNAL_ERROR_CODE
        || error_registry::entries().any(|(_, entry)| entry.code == code);

    if known {
        code
    } else {
        CUSTOM_CODE_LABEL
    }
}

/// Handler for the /metrics endpoint
/// Returns metrics in Prometheus exposition format
pub async fn metrics_handler(responder: Responder) -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => {
            let body = String::from_utf8(buffer).unwrap_or_default();
            (
                StatusCode::OK,
                [("Content-Type", encoder.format_type())],
                body,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            responder
                .error("Failed to encode metrics")
                .code("METRICS_ENCODING_FAILED")
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response()
        }
    }
}
