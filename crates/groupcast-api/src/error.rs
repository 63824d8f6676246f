//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use groupcast_core::CoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Core(e @ CoreError::GroupNotFound(_)) => {
                (StatusCode::NOT_FOUND, "GROUP_NOT_FOUND", e.to_string())
            }
            ApiError::Core(e @ CoreError::InvalidEndpoint { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                e.to_string(),
            ),
        };

        let body = axum::Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn error_code(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        (status, json["error"]["code"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (status, code) = error_code(ApiError::BadRequest("no group".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "BAD_REQUEST");

        let missing = CoreError::GroupNotFound("g9".to_string());
        let (status, code) = error_code(missing.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "GROUP_NOT_FOUND");

        let invalid = CoreError::InvalidEndpoint {
            group: "g1".to_string(),
            endpoint: "vmselect-a:8481".to_string(),
            reason: "missing scheme".to_string(),
        };
        let (status, code) = error_code(invalid.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
    }
}
