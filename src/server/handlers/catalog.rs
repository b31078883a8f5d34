//! Catalog endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::super::AppState;
use super::helpers::{failure, INVALID_MODEL};

#[derive(Debug, Deserialize)]
pub struct ModelInfoRequest {
    #[serde(default)]
    pub model: String,
}

/// Reload the catalog from its source.
pub async fn load_configs(State(state): State<AppState>) -> Response {
    match state.catalog.refresh().await {
        Ok(count) => Json(serde_json::json!({
            "success": true,
            "count": count,
            "models": state.catalog.names().await,
        }))
        .into_response(),
        Err(_) => failure(
            StatusCode::BAD_GATEWAY,
            "Failed to load model configurations from external source",
        ),
    }
}

/// Files and token requirement of one package.
pub async fn model_info(
    State(state): State<AppState>,
    Json(req): Json<ModelInfoRequest>,
) -> Response {
    let Some(package) = state.catalog.get(&req.model).await else {
        return failure(StatusCode::NOT_FOUND, INVALID_MODEL);
    };

    Json(serde_json::json!({
        "success": true,
        "model": req.model,
        "files": package.files,
        "requires_hf": package.hf,
    }))
    .into_response()
}
