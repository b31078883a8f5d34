//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // Catalog
        .route("/load_configs", get(handlers::load_configs))
        .route("/model_info", post(handlers::model_info))
        // Batches
        .route("/download", post(handlers::start_download))
        .route("/delete", post(handlers::start_delete))
        .route("/progress", get(handlers::progress))
        // Local files
        .route("/check_status", post(handlers::check_status))
        .route("/browse_directory", post(handlers::browse_directory))
        // Static assets (CSS/JS)
        .route("/static/styles.css", get(handlers::serve_css))
        .route("/static/script.js", get(handlers::serve_js))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
