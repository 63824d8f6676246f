//! Groupcast Endpoint Client
//!
//! This crate provides the client that performs one bounded-time GET
//! against a single backend endpoint, forwarding the caller's headers.

pub mod client;
pub mod error;

pub use client::{EndpointClient, EndpointClientConfig, join_url};
pub use error::{FailureKind, ProxyError};
