#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use scm_demo::{config::AppConfig, db, logging::discard_logger, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Application backed by a throwaway SQLite file and its own seed directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub seed_dir: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    /// Fresh database seeded from the data shipped in `seed/`.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let seed_dir = dir.path().join("seed");
        std::fs::create_dir_all(&seed_dir).expect("create seed dir");

        let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("seed");
        for entry in std::fs::read_dir(&shipped).expect("read shipped seed dir") {
            let entry = entry.expect("seed dir entry");
            std::fs::copy(entry.path(), seed_dir.join(entry.file_name()))
                .expect("copy seed file");
        }

        Self::build(dir, seed_dir).await
    }

    /// Fresh database whose seed directory holds exactly `files`.
    pub async fn with_seed_files(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let seed_dir = dir.path().join("seed");
        std::fs::create_dir_all(&seed_dir).expect("create seed dir");
        for (name, contents) in files {
            std::fs::write(seed_dir.join(name), contents).expect("write seed file");
        }

        Self::build(dir, seed_dir).await
    }

    async fn build(dir: TempDir, seed_dir: PathBuf) -> Self {
        let db_file = dir.path().join("scm_demo_test.db");
        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.seed_dir = seed_dir.clone();
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg, discard_logger());
        let router = scm_demo::app_router(state.clone());

        Self {
            router,
            state,
            seed_dir,
            _dir: dir,
        }
    }

    /// Send a request against the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request returning status and decoded JSON body (`Null` when empty).
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// Creates a demo through the API and returns its JSON.
    pub async fn create_demo(&self, name: &str) -> Value {
        let (status, body) = self
            .json(Method::POST, "/api/Demos", Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::OK, "create demo failed: {body}");
        body
    }

    pub async fn seed(&self) -> Value {
        let (status, body) = self.json(Method::POST, "/api/Demos/seed", None).await;
        assert_eq!(status, StatusCode::OK, "seed failed: {body}");
        body
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is json")
    }
}

pub fn guid_of(demo: &Value) -> String {
    demo["guid"].as_str().expect("demo has a guid").to_string()
}
