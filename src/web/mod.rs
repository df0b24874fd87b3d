//! HTTP API for EUCLOUD.
//!
//! JSON endpoints under `/api` for auth, files, folders and storage usage,
//! plus `/health` and the Swagger UI.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
