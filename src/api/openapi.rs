use utoipa::OpenApi;

use crate::api::handlers::RegistryListing;
use crate::errors::{ErrorKind, RegistryEntry};
use crate::response::{ErrorBody, FailureEnvelope};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Response Envelope Service",
        version = "0.1.0",
        description = "Uniform success and failure envelopes with centralized error translation.",
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::health_live,
        crate::api::handlers::list_registry,
    ),
    components(
        schemas(
            FailureEnvelope,
            ErrorBody,
            ErrorKind,
            RegistryEntry,
            RegistryListing,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "errors", description = "Error registry"),
    )
)]
pub struct ApiDoc;
