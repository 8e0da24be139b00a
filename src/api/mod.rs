//! HTTP surface.
//!
//! Thin axum layer over the registry repository and the classification
//! pipeline. `api_router()` returns a `Router` that can be mounted on
//! any axum server instance; `serve()` runs it on a bound address.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{build_context, serve, ServerError};
pub use types::ApiContext;
