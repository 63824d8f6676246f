//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Invalid endpoint {endpoint} in group {group}: {reason}")]
    InvalidEndpoint {
        group: String,
        endpoint: String,
        reason: String,
    },
}
