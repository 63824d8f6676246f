//! Groupcast HTTP API
//!
//! This crate provides the Axum-based HTTP surface: group fan-out queries,
//! group health, and the service's own liveness and metrics endpoints.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
