//! Web server for managing model packages.
//!
//! Serves a single page plus a small JSON API:
//! - Catalog loading and package details
//! - Background download and delete batches with a pollable progress snapshot
//! - On-disk status checks and a two-level directory browser

mod assets;
mod handlers;
mod routes;
mod template_structs;

pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::Settings;
use crate::services::{CatalogStore, OperationCoordinator, WgetDownloader};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    /// Owner of the single operation slot.
    pub coordinator: OperationCoordinator,
    pub catalog: CatalogStore,
    /// Base path shown in the page and used when a request omits one.
    pub default_base_path: PathBuf,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            coordinator: settings.create_coordinator(),
            catalog: settings.create_catalog()?,
            default_base_path: settings.base_path.clone(),
        })
    }

    /// Resolve the base path of a request, falling back to the default.
    pub fn base_path_or_default(&self, requested: Option<&str>) -> PathBuf {
        match requested.map(str::trim).filter(|p| !p.is_empty()) {
            Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
            None => self.default_base_path.clone(),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;

    let downloader = WgetDownloader::new(&settings.downloader);
    if !downloader.is_available() {
        tracing::warn!(
            "Downloader '{}' not found in PATH; downloads will fail",
            downloader.program()
        );
    }

    // A catalog failure only leaves the list empty until the next refresh
    if let Err(e) = state.catalog.refresh().await {
        tracing::warn!("Starting without model configurations: {}", e);
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::models::{Catalog, FileDescriptor, ModelPackage, OperationStatus};
    use crate::services::transfer::testing::FakeDownloader;
    use crate::services::ProgressLog;

    struct TestApp {
        state: AppState,
        fake: FakeDownloader,
        dir: tempfile::TempDir,
    }

    impl TestApp {
        fn router(&self) -> axum::Router {
            create_router(self.state.clone())
        }

        fn models_dir(&self) -> PathBuf {
            self.dir.path().join("models")
        }
    }

    fn test_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(
            "Wan 2.1".to_string(),
            ModelPackage {
                files: vec![
                    FileDescriptor::new("https://h/x/wan.safetensors", "diffusion_models"),
                    FileDescriptor::new("https://h/x/vae.safetensors?download=true", "/vae"),
                ],
                hf: false,
            },
        );
        catalog.insert(
            "Flux Dev".to_string(),
            ModelPackage {
                files: vec![FileDescriptor::new("https://h/x/flux.safetensors", "unet")],
                hf: true,
            },
        );
        catalog
    }

    async fn setup_test_app() -> TestApp {
        let dir = tempdir().unwrap();
        let catalog_path = dir.path().join("catalog.json");
        std::fs::write(&catalog_path, serde_json::to_string(&test_catalog()).unwrap()).unwrap();

        let fake = FakeDownloader::succeeding();
        let coordinator = OperationCoordinator::new(
            Arc::new(fake.clone()),
            ProgressLog::new(dir.path().join("progress.log")),
        )
        .with_step_delay(Duration::ZERO);
        let catalog =
            CatalogStore::new(catalog_path.to_string_lossy(), Duration::from_secs(1)).unwrap();
        catalog.set(test_catalog()).await;

        let state = AppState {
            coordinator,
            catalog,
            default_base_path: dir.path().join("models"),
        };

        TestApp { state, fake, dir }
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read_json(response).await
    }

    async fn post(
        app: axum::Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        read_json(response).await
    }

    async fn read_json(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn wait_for_idle(state: &AppState) {
        for _ in 0..200 {
            if !state.coordinator.state().await.status.is_running() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("batch did not finish");
    }

    #[tokio::test]
    async fn test_index_renders_default_path() {
        let app = setup_test_app().await;

        let response = app
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        let tmp_name = app.dir.path().file_name().unwrap().to_string_lossy();
        assert!(html.contains(tmp_name.as_ref()));
        assert!(html.contains("/static/script.js"));
    }

    #[tokio::test]
    async fn test_static_assets() {
        let app = setup_test_app().await;

        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .uri("/static/styles.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");

        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_load_configs_refreshes_catalog() {
        let app = setup_test_app().await;
        app.state.catalog.set(Catalog::new()).await;

        let (status, json) = get(app.router(), "/load_configs").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 2);
        assert_eq!(json["models"], serde_json::json!(["Flux Dev", "Wan 2.1"]));
    }

    #[tokio::test]
    async fn test_load_configs_failure_keeps_catalog() {
        let app = setup_test_app().await;
        std::fs::write(app.dir.path().join("catalog.json"), "not json").unwrap();

        let (status, json) = get(app.router(), "/load_configs").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["success"], false);
        assert_eq!(app.state.catalog.len().await, 2);
    }

    #[tokio::test]
    async fn test_model_info() {
        let app = setup_test_app().await;

        let (status, json) = post(
            app.router(),
            "/model_info",
            serde_json::json!({"model": "Flux Dev"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["requires_hf"], true);
        assert_eq!(json["files"][0]["directory"], "unet");

        let (status, json) = post(
            app.router(),
            "/model_info",
            serde_json::json!({"model": "Nope"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Invalid model selection");
    }

    #[tokio::test]
    async fn test_download_then_check_status() {
        let app = setup_test_app().await;
        let base = app.models_dir();

        let (status, json) = post(
            app.router(),
            "/download",
            serde_json::json!({"model": "Wan 2.1", "base_path": base}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Checking and downloading Wan 2.1 files...");

        wait_for_idle(&app.state).await;

        let (_, progress) = get(app.router(), "/progress").await;
        assert_eq!(progress["status"], "idle");
        assert_eq!(progress["current"], 2);
        assert_eq!(progress["total"], 2);
        assert_eq!(progress["progress"][1]["file"], "vae.safetensors");
        assert_eq!(progress["progress"][1]["status"], "success");
        assert_eq!(
            progress["current_progress"],
            "2 file(s) downloaded successfully"
        );

        let (status, json) = post(
            app.router(),
            "/check_status",
            serde_json::json!({"model": "Wan 2.1", "base_path": base}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 2);
        assert_eq!(json["found"], 2);
        assert_eq!(json["file_status"][1]["directory"], "/vae");
        assert!(base.join("vae/vae.safetensors").exists());
    }

    #[tokio::test]
    async fn test_check_status_lists_file_without_name() {
        let app = setup_test_app().await;
        let mut catalog = test_catalog();
        catalog.insert(
            "Broken".to_string(),
            ModelPackage {
                files: vec![
                    FileDescriptor::new("https://h/x/", "loras"),
                    FileDescriptor::new("https://h/x/lora.safetensors", "loras"),
                ],
                hf: false,
            },
        );
        app.state.catalog.set(catalog).await;

        let (status, json) = post(
            app.router(),
            "/check_status",
            serde_json::json!({"model": "Broken", "base_path": app.models_dir()}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["total"], 2);
        assert_eq!(json["found"], 0);
        assert_eq!(json["file_status"][0]["exists"], false);
        assert_eq!(json["file_status"][0]["filename"], "https://h/x/");
        assert_eq!(json["file_status"][1]["filename"], "lora.safetensors");
    }

    #[tokio::test]
    async fn test_download_uses_default_base_path() {
        let app = setup_test_app().await;

        let (status, _) = post(
            app.router(),
            "/download",
            serde_json::json!({"model": "Wan 2.1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        wait_for_idle(&app.state).await;

        assert!(app
            .models_dir()
            .join("diffusion_models/wan.safetensors")
            .exists());
    }

    #[tokio::test]
    async fn test_download_requires_token() {
        let app = setup_test_app().await;

        let (status, json) = post(
            app.router(),
            "/download",
            serde_json::json!({"model": "Flux Dev", "base_path": app.models_dir(), "hf_token": ""}),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
        assert_eq!(
            json["message"],
            "Hugging Face token is required for Flux Dev. Please provide your HF token and try again."
        );
        assert_eq!(
            app.state.coordinator.state().await.status,
            OperationStatus::Idle
        );
        assert_eq!(app.fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_model_rejected() {
        let app = setup_test_app().await;

        let (status, json) = post(
            app.router(),
            "/delete",
            serde_json::json!({"model": "Nope", "base_path": app.models_dir()}),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Invalid model selection");
    }

    #[tokio::test]
    async fn test_busy_returns_conflict() {
        let mut app = setup_test_app().await;
        app.state.coordinator = app
            .state
            .coordinator
            .clone()
            .with_step_delay(Duration::from_millis(300));

        let (status, _) = post(
            app.router(),
            "/download",
            serde_json::json!({"model": "Wan 2.1", "base_path": app.models_dir()}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = post(
            app.router(),
            "/delete",
            serde_json::json!({"model": "Wan 2.1", "base_path": app.models_dir()}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["success"], false);

        wait_for_idle(&app.state).await;
    }

    #[tokio::test]
    async fn test_delete_never_downloaded() {
        let app = setup_test_app().await;

        let (status, json) = post(
            app.router(),
            "/delete",
            serde_json::json!({"model": "Flux Dev", "base_path": app.models_dir()}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Checking and deleting Flux Dev files...");
        wait_for_idle(&app.state).await;

        let (_, progress) = get(app.router(), "/progress").await;
        assert_eq!(progress["progress"][0]["status"], "not_found");
        assert_eq!(
            progress["current_progress"],
            "Deletion completed: 0 deleted, 1 files were not found"
        );
    }

    #[tokio::test]
    async fn test_browse_directory() {
        let app = setup_test_app().await;
        std::fs::create_dir_all(app.models_dir().join("vae")).unwrap();
        std::fs::write(app.models_dir().join("vae/ae.safetensors"), b"1234").unwrap();

        let (status, json) = post(
            app.router(),
            "/browse_directory",
            serde_json::json!({"path": app.models_dir()}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["structure"][0]["name"], "vae");
        assert_eq!(json["structure"][0]["type"], "folder");
        assert_eq!(json["structure"][0]["children"][0]["size"], 4);

        let (status, json) = post(
            app.router(),
            "/browse_directory",
            serde_json::json!({"path": app.dir.path().join("missing")}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Path does not exist");
    }

    #[test]
    fn test_base_path_or_default() {
        let state = AppState {
            coordinator: OperationCoordinator::new(
                Arc::new(FakeDownloader::succeeding()),
                ProgressLog::default(),
            ),
            catalog: CatalogStore::new("https://example.invalid/c.json", Duration::from_secs(1))
                .unwrap(),
            default_base_path: PathBuf::from("/workspace/ComfyUI/models"),
        };

        assert_eq!(
            state.base_path_or_default(None),
            PathBuf::from("/workspace/ComfyUI/models")
        );
        assert_eq!(
            state.base_path_or_default(Some("  ")),
            PathBuf::from("/workspace/ComfyUI/models")
        );
        assert_eq!(
            state.base_path_or_default(Some("/data/models")),
            PathBuf::from("/data/models")
        );
    }
}
