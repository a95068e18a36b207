use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Dispatch tag for an [`AppError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Generic,
    NotFound,
    Validation,
    Unauthorized,
    Forbidden,
}

impl ErrorKind {
    /// Every kind, in declaration order
    pub const ALL: [ErrorKind; 5] = [
        Self::Generic,
        Self::NotFound,
        Self::Validation,
        Self::Unauthorized,
        Self::Forbidden,
    ];
}

/// Domain errors raised by request handlers.
///
/// The message is internal: clients see the public message registered for the
/// kind, while this text only travels in logs and `meta.internal`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{0}")]
    Generic(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Generic(_) => ErrorKind::Generic,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Generic(message)
            | Self::NotFound(message)
            | Self::Validation(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message) => message,
        }
    }
}

/// Helpers for raising common errors
impl AppError {
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}
