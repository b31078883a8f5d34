//! Batch endpoints: start a download or delete, poll progress.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::super::AppState;
use super::helpers::{accepted, coordinator_status, failure, INVALID_MODEL};

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub hf_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub base_path: Option<String>,
}

/// Start downloading every file of a package in the background.
pub async fn start_download(
    State(state): State<AppState>,
    Json(req): Json<DownloadRequest>,
) -> Response {
    let Some(package) = state.catalog.get(&req.model).await else {
        return failure(StatusCode::NOT_FOUND, INVALID_MODEL);
    };
    let base_path = state.base_path_or_default(req.base_path.as_deref());

    match state
        .coordinator
        .start_package_download(&req.model, &package, base_path, req.hf_token)
        .await
    {
        Ok(_) => accepted(format!("Checking and downloading {} files...", req.model)),
        Err(e) => {
            tracing::debug!("Download of {} rejected: {}", req.model, e);
            failure(coordinator_status(&e), e.to_string())
        }
    }
}

/// Start deleting every file of a package in the background.
pub async fn start_delete(
    State(state): State<AppState>,
    Json(req): Json<DeleteRequest>,
) -> Response {
    let Some(package) = state.catalog.get(&req.model).await else {
        return failure(StatusCode::NOT_FOUND, INVALID_MODEL);
    };
    let base_path = state.base_path_or_default(req.base_path.as_deref());

    match state
        .coordinator
        .start_package_delete(&package, base_path)
        .await
    {
        Ok(_) => accepted(format!("Checking and deleting {} files...", req.model)),
        Err(e) => {
            tracing::debug!("Deletion of {} rejected: {}", req.model, e);
            failure(coordinator_status(&e), e.to_string())
        }
    }
}

/// Current progress snapshot.
pub async fn progress(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.coordinator.snapshot().await)
}
