use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

use super::kinds::AppError;
use super::registry;
use crate::metrics::UNHANDLED_ERRORS_TOTAL;
use crate::response::{RequestContext, Responder};

/// Public message for errors with no registry entry
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

/// Code for errors with no registry entry
pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_SERVER_ERROR";

/// Error handler settings
#[derive(Debug, Clone)]
pub struct ErrorHandlerConfig {
    /// Copy the raised error's own message into `meta.internal`
    pub expose_internal: bool,
}

impl Default for ErrorHandlerConfig {
    fn default() -> Self {
        Self {
            expose_internal: true,
        }
    }
}

/// An error a handler raised, travelling back through the middleware stack
/// in the response extensions.
#[derive(Debug, Clone)]
pub struct RaisedError(pub Arc<anyhow::Error>);

/// Terminal stage: turns a raised error into exactly one failure envelope.
pub async fn error_handler(
    State(config): State<ErrorHandlerConfig>,
    request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::from_request(&request);
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<RaisedError>() {
        Some(RaisedError(err)) => handle_error(&config, &err, context),
        None => response,
    }
}

/// Build the failure response for `err` raised while serving `context`
pub fn handle_error(
    config: &ErrorHandlerConfig,
    err: &anyhow::Error,
    context: RequestContext,
) -> Response {
    let responder = Responder::new(context);

    let reply = match registry::resolve_error(err) {
        Some(entry) => {
            debug!(
                endpoint = %responder.context().endpoint,
                method = %responder.context().method,
                code = entry.code,
                error = ?err,
                "Mapped error"
            );
            responder
                .error(entry.message)
                .code(entry.code)
                .status(entry.status_code())
        }
        None => {
            error!(
                endpoint = %responder.context().endpoint,
                method = %responder.context().method,
                error = ?err,
                "Unhandled error"
            );
            UNHANDLED_ERRORS_TOTAL.inc();
            responder
                .error(UNEXPECTED_MESSAGE)
                .code(INTERNAL_ERROR_CODE)
                .status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    if config.expose_internal {
        reply
            .meta([("internal", internal_message(err))])
            .into_response()
    } else {
        reply.into_response()
    }
}

/// The raised error's own message: the taxonomy message when an [`AppError`]
/// sits anywhere in the chain, otherwise the whole chain on one line.
fn internal_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<AppError>() {
        Some(app_err) => app_err.message().to_string(),
        None => format!("{:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use axum::http::Method;
    use serde_json::Value;

    fn context() -> RequestContext {
        RequestContext {
            endpoint: "/items".to_string(),
            method: Method::POST,
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_mapped_error() {
        let err = anyhow::Error::new(AppError::validation("bad field"));
        let response = handle_error(&ErrorHandlerConfig::default(), &err, context());

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Invalid or missing data");
        assert!(body["error"]["details"].is_null());
        assert_eq!(body["meta"]["internal"], "bad field");
        assert_eq!(body["meta"]["responseCode"], 422);
        assert_eq!(body["meta"]["method"], "POST");
    }

    #[tokio::test]
    async fn test_unmapped_error() {
        let err = anyhow::anyhow!("connection reset");
        let response = handle_error(&ErrorHandlerConfig::default(), &err, context());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], INTERNAL_ERROR_CODE);
        assert_eq!(body["error"]["message"], UNEXPECTED_MESSAGE);
        assert_eq!(body["meta"]["internal"], "connection reset");
    }

    #[tokio::test]
    async fn test_generic_kind_is_internal() {
        let err = anyhow::Error::new(AppError::generic("base error"));
        let response = handle_error(&ErrorHandlerConfig::default(), &err, context());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_hidden_when_disabled() {
        let config = ErrorHandlerConfig {
            expose_internal: false,
        };
        let err = anyhow::Error::new(AppError::not_found("item 42 missing"));
        let response = handle_error(&config, &err, context());

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["meta"].get("internal").is_none());
        assert_eq!(body["error"]["message"], "Resource not found");
    }

    #[tokio::test]
    async fn test_internal_is_taxonomy_message_under_context() {
        let result: Result<(), AppError> = Err(AppError::forbidden("user 7 does not own item 3"));
        let err = result.context("deleting item 3").unwrap_err();
        let response = handle_error(&ErrorHandlerConfig::default(), &err, context());

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "FORBIDDEN");
        assert_eq!(body["meta"]["internal"], "user 7 does not own item 3");
    }

    #[tokio::test]
    async fn test_internal_keeps_foreign_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        let err = anyhow::Error::new(io_err).context("syncing ledger");
        let response = handle_error(&ErrorHandlerConfig::default(), &err, context());

        let body = body_json(response).await;
        assert_eq!(body["meta"]["internal"], "syncing ledger: socket closed");
    }
}
