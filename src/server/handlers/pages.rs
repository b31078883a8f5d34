//! HTML page handlers.

use askama::Template;
use axum::{extract::State, response::Html};

use super::super::template_structs::IndexTemplate;
use super::super::AppState;

/// Main page with the default base path filled in.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let default_path = state.default_base_path.to_string_lossy();
    let template = IndexTemplate {
        title: "Model Manager",
        default_path: &default_path,
        version: env!("CARGO_PKG_VERSION"),
    };

    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}

pub async fn health() -> &'static str {
    "OK"
}
