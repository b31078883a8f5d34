//! Local filesystem endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::super::AppState;
use super::helpers::{failure, INVALID_MODEL};
use crate::services::{self, BrowseError};

#[derive(Debug, Deserialize)]
pub struct CheckStatusRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub base_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrowseRequest {
    #[serde(default)]
    pub path: String,
}

/// Which files of a package already exist under the base path.
pub async fn check_status(
    State(state): State<AppState>,
    Json(req): Json<CheckStatusRequest>,
) -> Response {
    let Some(package) = state.catalog.get(&req.model).await else {
        return failure(StatusCode::NOT_FOUND, INVALID_MODEL);
    };
    let base_path = state.base_path_or_default(req.base_path.as_deref());

    let status = services::check_package(&package.files, &base_path).await;
    Json(serde_json::json!({
        "success": true,
        "model": req.model,
        "base_path": base_path,
        "total": status.total,
        "found": status.found,
        "file_status": status.file_status,
    }))
    .into_response()
}

/// Two-level listing of a directory for the file explorer.
pub async fn browse_directory(Json(req): Json<BrowseRequest>) -> Response {
    match services::browse_directory(&req.path).await {
        Ok(structure) => Json(serde_json::json!({
            "success": true,
            "structure": structure,
        }))
        .into_response(),
        Err(e) => {
            let status = match e {
                BrowseError::EmptyPath | BrowseError::NotADirectory => StatusCode::BAD_REQUEST,
                BrowseError::NotFound => StatusCode::NOT_FOUND,
                BrowseError::PermissionDenied => StatusCode::FORBIDDEN,
                BrowseError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            failure(status, e.to_string())
        }
    }
}
