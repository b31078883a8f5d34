//! Shared response helpers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::services::CoordinatorError;

pub const INVALID_MODEL: &str = "Invalid model selection";

/// `{success: false, message}` with the given status.
pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `{success: true, message}`.
pub fn accepted(message: impl Into<String>) -> Response {
    Json(serde_json::json!({
        "success": true,
        "message": message.into(),
    }))
    .into_response()
}

pub fn coordinator_status(err: &CoordinatorError) -> StatusCode {
    match err {
        CoordinatorError::Busy { .. } => StatusCode::CONFLICT,
        CoordinatorError::TokenRequired(_) => StatusCode::UNAUTHORIZED,
        CoordinatorError::EmptyBatch => StatusCode::BAD_REQUEST,
    }
}
