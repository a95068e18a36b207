use axum::http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

use super::kinds::{AppError, ErrorKind};

/// Public presentation of a mapped error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RegistryEntry {
    /// Message shown to clients in place of the internal one
    #[schema(value_type = String)]
    pub message: &'static str,
    /// Machine-readable error code
    #[schema(value_type = String)]
    pub code: &'static str,
    /// HTTP status of the failure response
    pub status: u16,
}

impl RegistryEntry {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

static VALIDATION: RegistryEntry = RegistryEntry {
    message: "Invalid or missing data",
    code: "VALIDATION_ERROR",
    status: 422,
};

static NOT_FOUND: RegistryEntry = RegistryEntry {
    message: "Resource not found",
    code: "NOT_FOUND",
    status: 404,
};

static UNAUTHORIZED: RegistryEntry = RegistryEntry {
    message: "Authentication required",
    code: "UNAUTHORIZED",
    status: 401,
};

static FORBIDDEN: RegistryEntry = RegistryEntry {
    message: "Access denied",
    code: "FORBIDDEN",
    status: 403,
};

/// Look up the public presentation for an error kind.
///
/// `Generic` has no entry and falls through to the internal-error response.
pub fn resolve(kind: ErrorKind) -> Option<&'static RegistryEntry> {
    match kind {
        ErrorKind::Validation => Some(&VALIDATION),
        ErrorKind::NotFound => Some(&NOT_FOUND),
        ErrorKind::Unauthorized => Some(&UNAUTHORIZED),
        ErrorKind::Forbidden => Some(&FORBIDDEN),
        ErrorKind::Generic => None,
    }
}

/// Resolve an arbitrary raised error.
///
/// Context attached with `anyhow` is looked through; anything that is not an
/// [`AppError`] is unmapped.
pub fn resolve_error(err: &anyhow::Error) -> Option<&'static RegistryEntry> {
    err.downcast_ref::<AppError>()
        .and_then(|app_err| resolve(app_err.kind()))
}

/// All mapped kinds with their entries
pub fn entries() -> impl Iterator<Item = (ErrorKind, &'static RegistryEntry)> {
    ErrorKind::ALL
        .into_iter()
        .filter_map(|kind| resolve(kind).map(|entry| (kind, entry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_mapped_kinds() {
        let entry = resolve(ErrorKind::NotFound).unwrap();
        assert_eq!(entry.message, "Resource not found");
        assert_eq!(entry.code, "NOT_FOUND");
        assert_eq!(entry.status, 404);

        let entry = resolve(ErrorKind::Validation).unwrap();
        assert_eq!(entry.message, "Invalid or missing data");
        assert_eq!(entry.code, "VALIDATION_ERROR");
        assert_eq!(entry.status, 422);

        let entry = resolve(ErrorKind::Unauthorized).unwrap();
        assert_eq!(entry.message, "Authentication required");
        assert_eq!(entry.code, "UNAUTHORIZED");
        assert_eq!(entry.status, 401);

        let entry = resolve(ErrorKind::Forbidden).unwrap();
        assert_eq!(entry.message, "Access denied");
        assert_eq!(entry.code, "FORBIDDEN");
        assert_eq!(entry.status, 403);
    }

    #[test]
    fn test_generic_is_unmapped() {
        assert!(resolve(ErrorKind::Generic).is_none());
        assert!(resolve_error(&anyhow::Error::new(AppError::generic("boom"))).is_none());
    }

    #[test]
    fn test_foreign_error_is_unmapped() {
        let err = anyhow::Error::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        ));
        assert!(resolve_error(&err).is_none());
        assert!(resolve_error(&anyhow::anyhow!("plain message")).is_none());
    }

    #[test]
    fn test_resolve_through_context() {
        let result: Result<(), AppError> = Err(AppError::forbidden("not owner"));
        let err = result.context("loading item").unwrap_err();
        assert_eq!(resolve_error(&err).unwrap().code, "FORBIDDEN");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            resolve(ErrorKind::Validation).unwrap().status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            resolve(ErrorKind::Unauthorized).unwrap().status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_entries_cover_mapped_kinds() {
        let kinds: Vec<ErrorKind> = entries().map(|(kind, _)| kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::NotFound,
                ErrorKind::Validation,
                ErrorKind::Unauthorized,
                ErrorKind::Forbidden,
            ]
        );
    }
}
