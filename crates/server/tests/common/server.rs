//! Server test utilities.

use super::fixtures::test_signer;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use scout_core::config::{AppConfig, ContentMode};
use scout_server::state::build_resolver;
use scout_server::{AppState, create_router};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    temp_dir: TempDir,
}

/// A buffered response.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[allow(dead_code)]
impl TestServer {
    /// Local mode over an empty temporary content tree.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Remote mode against `base_url`.
    pub fn remote(base_url: &str) -> Self {
        let base_url = base_url.to_string();
        Self::with_config(move |config| {
            config.content.mode = ContentMode::Remote;
            config.content.remote_base_url = base_url;
            config.content.request_timeout_secs = 2;
        })
    }

    /// Create a test server with custom config modifications.
    pub fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        std::fs::create_dir_all(temp_dir.path().join("scripts")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("bin")).unwrap();

        let mut config = AppConfig::for_testing(temp_dir.path());
        modifier(&mut config);

        let resolver = build_resolver(&config).expect("Failed to build resolver");
        let state = AppState::new(config, resolver, test_signer());
        let router = create_router(state.clone());

        Self {
            router,
            state,
            temp_dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a content file at `key` (e.g. "scripts/linux/setup.sh").
    pub fn write(&self, key: &str, data: &[u8]) {
        let path = self.root().join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, data).unwrap();
    }

    /// GET `uri` through the router.
    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
