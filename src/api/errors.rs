use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message returned to callers when the crew fails; the real cause is only logged
pub const PIPELINE_FAILURE_MESSAGE: &str =
    "Something went wrong while processing your request. Please try again.";

/// API error type with HTTP status code and message
///
/// Client errors render as `{"error": message}`. Server errors render as
/// `{"status": "error", "response": message}` to match the success envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates the generic 500 returned when the pipeline fails
    pub fn pipeline_failure() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, PIPELINE_FAILURE_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = if self.status.is_server_error() {
            Json(json!({
                "status": "error",
                "response": self.message
            }))
        } else {
            Json(json!({
                "error": self.message
            }))
        };

        (self.status, body).into_response()
    }
}
