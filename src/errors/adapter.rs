use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{future::BoxFuture, FutureExt};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::handler::{RaisedError, INTERNAL_ERROR_CODE, UNEXPECTED_MESSAGE};
use crate::response::{ApiResponse, Metadata, Responder};

/// Error type for handlers. Anything convertible to `anyhow::Error`,
/// including [`AppError`](super::AppError), can be raised with `?`.
#[derive(Debug)]
pub struct HandlerError(anyhow::Error);

pub type HandlerResult<T = Response> = Result<T, HandlerError>;

impl<E> From<E> for HandlerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for HandlerError {
    /// Masked 500 carrying the error for the error handler stage, which
    /// replaces this body. Served as-is only when that stage is missing.
    fn into_response(self) -> Response {
        let envelope = ApiResponse::error(
            UNEXPECTED_MESSAGE,
            Some(INTERNAL_ERROR_CODE),
            None,
            Metadata::new(),
        );
        let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(envelope)).into_response();
        response
            .extensions_mut()
            .insert(RaisedError(Arc::new(self.0)));
        response
    }
}

/// Wrap an async handler so every failure reaches the error handler.
///
/// `Err` results and panics inside the future are both forwarded; successful
/// replies pass through untouched.
pub fn async_handler<F, Fut, R, E>(
    handler: F,
) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static
where
    F: Fn(Request, Responder) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse + Send + 'static,
    E: Into<anyhow::Error> + Send + 'static,
{
    move |request: Request| {
        let handler = handler.clone();
        async move {
            let responder = Responder::for_request(&request);
            let outcome = AssertUnwindSafe(async move { handler(request, responder).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(reply)) => reply.into_response(),
                Ok(Err(err)) => HandlerError::from(err).into_response(),
                Err(panic) => HandlerError(anyhow::anyhow!(
                    "handler panicked: {}",
                    panic_message(&*panic)
                ))
                .into_response(),
            }
        }
        .boxed()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
