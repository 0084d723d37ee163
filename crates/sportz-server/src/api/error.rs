//! REST error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::validation::Issue;

/// A failed REST call, rendered as `{error, details?}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400 with validation issues.
    #[error("{error}")]
    BadRequest {
        /// Short summary.
        error: &'static str,
        /// What was wrong.
        details: Vec<Issue>,
    },
    /// 404.
    #[error("{0}")]
    NotFound(&'static str),
    /// 500. The cause is logged where it happens.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// 400 with `details`.
    pub fn bad_request(error: &'static str, details: Vec<Issue>) -> Self {
        Self::BadRequest { error, details }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest { error, details } => json!({"error": error, "details": details}),
            Self::NotFound(error) | Self::Internal(error) => json!({"error": error}),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn bad_request_carries_details() {
        let err = ApiError::bad_request("Invalid payload", vec![Issue::new("sport", "Sport is required")]);
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Invalid payload");
        assert_eq!(body["details"][0]["path"], "sport");
    }

    #[tokio::test]
    async fn not_found_has_only_error() {
        let resp = ApiError::NotFound("Match not found").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, json!({"error": "Match not found"}));
    }

    #[test]
    fn internal_status() {
        assert_eq!(
            ApiError::Internal("Failed to create match.").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
