//! HTTP server for signed script and binary distribution.
//!
//! This crate provides:
//! - Script and binary endpoints that return content with an `X-Signature` header
//! - A hash-only script endpoint for lightweight integrity checks
//! - Health and Prometheus metrics endpoints

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
