//! Endpoint client error types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Invalid endpoint URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Endpoint unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("Endpoint timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Coarse classification of a per-endpoint failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidUrl,
    Unreachable,
    Timeout,
    ReadError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidUrl => "invalid_url",
            FailureKind::Unreachable => "unreachable",
            FailureKind::Timeout => "timeout",
            FailureKind::ReadError => "read_error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProxyError {
    /// Classify this error for per-endpoint reporting
    pub fn kind(&self) -> FailureKind {
        match self {
            ProxyError::InvalidUrl { .. } => FailureKind::InvalidUrl,
            ProxyError::Timeout(_) => FailureKind::Timeout,
            ProxyError::ReadBody(_) => FailureKind::ReadError,
            ProxyError::Unreachable(e) | ProxyError::Client(e) if e.is_timeout() => {
                FailureKind::Timeout
            }
            ProxyError::Unreachable(_) | ProxyError::Client(_) => FailureKind::Unreachable,
        }
    }
}
