use axum::{extract::Request, middleware::Next, response::Response};

use super::responder::RequestContext;

/// Record the request's endpoint and method for [`Responder`](super::Responder).
///
/// Emits nothing itself; the handler's reply carries the envelope.
pub async fn response_middleware(mut request: Request, next: Next) -> Response {
    let context = RequestContext::from_request(&request);
    request.extensions_mut().insert(context);

    next.run(request).await
}
