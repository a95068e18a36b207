//! Uniform success and failure envelopes

pub mod envelope;
pub mod middleware;
pub mod responder;

pub use envelope::{ApiResponse, ErrorBody, FailureEnvelope, Metadata, SuccessEnvelope};
pub use middleware::response_middleware;
pub use responder::{DataReply, ErrorReply, RequestContext, Responder};
