use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Envelope metadata: `timestamp` plus any extra key/value pairs
pub type Metadata = Map<String, Value>;

/// Code used when a failure is emitted without an explicit one
pub const DEFAULT_ERROR_CODE: &str = "ERROR";

/// Successful response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Response payload
    pub data: T,
    /// Response metadata
    pub meta: Metadata,
}

/// Failed response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FailureEnvelope {
    /// Error details
    pub error: ErrorBody,
    /// Response metadata
    #[schema(value_type = Object)]
    pub meta: Metadata,
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Additional context, `null` when absent
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

/// Envelope constructors
pub struct ApiResponse;

impl ApiResponse {
    /// Wrap `data` in a success envelope.
    ///
    /// `extra` is merged over the generated metadata, so an explicit
    /// `timestamp` entry replaces the generated one.
    pub fn success<T>(data: T, extra: Metadata) -> SuccessEnvelope<T> {
        SuccessEnvelope {
            data,
            meta: build_meta(extra),
        }
    }

    /// Build a failure envelope. `code` falls back to [`DEFAULT_ERROR_CODE`].
    pub fn error(
        message: impl Into<String>,
        code: Option<&str>,
        details: Option<Value>,
        extra: Metadata,
    ) -> FailureEnvelope {
        FailureEnvelope {
            error: ErrorBody {
                message: message.into(),
                code: code.unwrap_or(DEFAULT_ERROR_CODE).to_string(),
                details,
            },
            meta: build_meta(extra),
        }
    }
}

/// Current time as an RFC 3339 UTC string with millisecond precision
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn build_meta(extra: Metadata) -> Metadata {
    let mut meta = Metadata::new();
    meta.insert("timestamp".to_string(), Value::String(timestamp()));
    merge_meta(&mut meta, extra);
    meta
}

/// Shallow merge: keys in `overrides` replace keys in `base`
pub fn merge_meta(base: &mut Metadata, overrides: Metadata) {
    for (key, value) in overrides {
        base.insert(key, value);
    }
}
