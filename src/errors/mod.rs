//! Error taxonomy, registry, and the terminal error handler

pub mod adapter;
pub mod handler;
pub mod kinds;
pub mod registry;

pub use adapter::{async_handler, HandlerError, HandlerResult};
pub use handler::{error_handler, ErrorHandlerConfig, RaisedError};
pub use kinds::{AppError, ErrorKind};
pub use registry::{resolve, resolve_error, RegistryEntry};
