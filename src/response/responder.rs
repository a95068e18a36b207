use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, OriginalUri, Request},
    http::{request::Parts, Extensions, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::convert::Infallible;

use super::envelope::{merge_meta, ApiResponse, FailureEnvelope, Metadata, SuccessEnvelope};
use crate::metrics::record_envelope;

/// Request details copied into every envelope's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Path and query as the client sent it
    pub endpoint: String,
    pub method: Method,
}

impl RequestContext {
    /// Capture context from request pieces, preferring what the response
    /// middleware already stored and the pre-nesting URI when present.
    pub fn capture(uri: &Uri, method: &Method, extensions: &Extensions) -> Self {
        if let Some(context) = extensions.get::<RequestContext>() {
            return context.clone();
        }

        let uri = extensions
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(uri);

        Self {
            endpoint: uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| uri.path().to_string()),
            method: method.clone(),
        }
    }

    pub fn from_request(request: &Request) -> Self {
        Self::capture(request.uri(), request.method(), request.extensions())
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::capture(&parts.uri, &parts.method, &parts.extensions)
    }

    /// Default metadata for a response with `status`
    pub fn base_meta(&self, status: StatusCode) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert("endpoint".to_string(), Value::String(self.endpoint.clone()));
        meta.insert(
            "method".to_string(),
            Value::String(self.method.as_str().to_string()),
        );
        meta.insert("responseCode".to_string(), json!(status.as_u16()));
        meta
    }
}

/// Per-request response helpers.
///
/// `data` and `error` take `self`, so a handler can build at most one reply.
#[derive(Debug)]
pub struct Responder {
    context: RequestContext,
}

impl Responder {
    pub fn new(context: RequestContext) -> Self {
        Self { context }
    }

    pub fn for_request(request: &Request) -> Self {
        Self::new(RequestContext::from_request(request))
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Success reply, status 200 unless overridden
    pub fn data<T: Serialize>(self, payload: T) -> DataReply<T> {
        DataReply {
            context: self.context,
            payload,
            status: StatusCode::OK,
            meta: Metadata::new(),
        }
    }

    /// Failure reply, status 400 and code `ERROR` unless overridden
    pub fn error(self, message: impl Into<String>) -> ErrorReply {
        ErrorReply {
            context: self.context,
            message: message.into(),
            code: None,
            status: StatusCode::BAD_REQUEST,
            details: None,
            meta: Metadata::new(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Responder
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new(RequestContext::from_parts(parts)))
    }
}

/// Successful reply built by [`Responder::data`]
#[derive(Debug)]
pub struct DataReply<T> {
    context: RequestContext,
    payload: T,
    status: StatusCode,
    meta: Metadata,
}

impl<T: Serialize> DataReply<T> {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Merge caller metadata; these keys win over the request defaults
    pub fn meta<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        extend_meta(&mut self.meta, entries);
        self
    }

    pub fn into_envelope(self) -> (StatusCode, SuccessEnvelope<T>) {
        let mut meta = self.context.base_meta(self.status);
        merge_meta(&mut meta, self.meta);
        (self.status, ApiResponse::success(self.payload, meta))
    }
}

impl<T: Serialize> IntoResponse for DataReply<T> {
    fn into_response(self) -> Response {
        let (status, envelope) = self.into_envelope();
        record_envelope("success", "OK", status);
        (status, Json(envelope)).into_response()
    }
}

/// Failure reply built by [`Responder::error`]
#[derive(Debug)]
pub struct ErrorReply {
    context: RequestContext,
    message: String,
    code: Option<String>,
    status: StatusCode,
    details: Option<Value>,
    meta: Metadata,
}

impl ErrorReply {
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Merge caller metadata; these keys win over the request defaults
    pub fn meta<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        extend_meta(&mut self.meta, entries);
        self
    }

    pub fn into_envelope(self) -> (StatusCode, FailureEnvelope) {
        let mut meta = self.context.base_meta(self.status);
        merge_meta(&mut meta, self.meta);
        let envelope = ApiResponse::error(self.message, self.code.as_deref(), self.details, meta);
        (self.status, envelope)
    }
}

impl IntoResponse for ErrorReply {
    fn into_response(self) -> Response {
        let (status, envelope) = self.into_envelope();
        record_envelope("failure", &envelope.error.code, status);
        (status, Json(envelope)).into_response()
    }
}

fn extend_meta<K, V>(meta: &mut Metadata, entries: impl IntoIterator<Item = (K, V)>)
where
    K: Into<String>,
    V: Into<Value>,
{
    meta.extend(entries.into_iter().map(|(key, value)| (key.into(), value.into())));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responder(method: Method, endpoint: &str) -> Responder {
        Responder::new(RequestContext {
            endpoint: endpoint.to_string(),
            method,
        })
    }

    #[test]
    fn test_data_defaults() {
        let (status, envelope) = responder(Method::GET, "/foo")
            .data(json!({"x": "a"}))
            .into_envelope();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.data, json!({"x": "a"}));
        assert_eq!(envelope.meta["endpoint"], "/foo");
        assert_eq!(envelope.meta["method"], "GET");
        assert_eq!(envelope.meta["responseCode"], 200);
        assert!(envelope.meta["timestamp"].is_string());
    }

    #[test]
    fn test_caller_meta_wins() {
        let (status, envelope) = responder(Method::GET, "/foo")
            .data(json!({"x": "a"}))
            .meta([("responseCode", 999)])
            .into_envelope();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.meta["responseCode"], 999);
        assert_eq!(envelope.meta["method"], "GET");
        assert_eq!(envelope.meta["endpoint"], "/foo");
    }

    #[test]
    fn test_data_custom_status() {
        let (status, envelope) = responder(Method::POST, "/items")
            .data(json!({"id": 1}))
            .status(StatusCode::CREATED)
            .into_envelope();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(envelope.meta["responseCode"], 201);
    }

    #[test]
    fn test_error_defaults() {
        let (status, envelope) = responder(Method::DELETE, "/items/3")
            .error("Cannot delete")
            .into_envelope();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.error.message, "Cannot delete");
        assert_eq!(envelope.error.code, "ERROR");
        assert!(envelope.error.details.is_none());
        assert_eq!(envelope.meta["responseCode"], 400);
        assert_eq!(envelope.meta["method"], "DELETE");
    }

    #[test]
    fn test_error_overrides() {
        let (status, envelope) = responder(Method::PUT, "/items/3")
            .error("Version conflict")
            .code("CONFLICT")
            .status(StatusCode::CONFLICT)
            .details(json!({"expected": 4}))
            .meta([("retryable", false)])
            .into_envelope();

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(envelope.error.code, "CONFLICT");
        assert_eq!(envelope.error.details, Some(json!({"expected": 4})));
        assert_eq!(envelope.meta["retryable"], false);
        assert_eq!(envelope.meta["responseCode"], 409);
    }

    #[test]
    fn test_meta_accepts_map_and_accumulates() {
        let mut extra = Metadata::new();
        extra.insert("page".to_string(), json!(2));
        extra.insert("method".to_string(), json!("HEAD"));

        let (_, envelope) = responder(Method::GET, "/")
            .data(1)
            .meta(extra)
            .meta([("total", json!(40))])
            .into_envelope();

        assert_eq!(envelope.meta["page"], 2);
        assert_eq!(envelope.meta["total"], 40);
        assert_eq!(envelope.meta["method"], "HEAD");
        assert_eq!(envelope.meta.len(), 6);
    }

    #[test]
    fn test_capture_prefers_stored_context() {
        let mut extensions = Extensions::new();
        extensions.insert(RequestContext {
            endpoint: "/api/users?page=2".to_string(),
            method: Method::GET,
        });
        let uri: Uri = "/users".parse().unwrap();

        let context = RequestContext::capture(&uri, &Method::GET, &extensions);
        assert_eq!(context.endpoint, "/api/users?page=2");
    }

    #[test]
    fn test_capture_keeps_query() {
        let uri: Uri = "/search?q=sol".parse().unwrap();
        let context = RequestContext::capture(&uri, &Method::GET, &Extensions::new());
        assert_eq!(context.endpoint, "/search?q=sol");
    }
}
