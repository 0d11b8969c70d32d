//! Common test utilities for in-process API testing.
//!
//! The fixture wires a real SQLite repack store in a temp dir to a running
//! index worker and the full router, so requests go through the same stack
//! as the binary without binding a port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

use repackhub_core::{
    create_index_service, Config, DatabaseConfig, IndexConfig, RepackIndexHandle, RepackStore,
    ServerConfig, SqliteRepackStore,
};
use repackhub_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use repackhub_core::testing::fixtures;

/// Test fixture with a live index worker behind the router.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Backing repack collection; insert rows here, then index
    pub store: Arc<SqliteRepackStore>,
    /// Handle to the same worker the router talks to
    pub index: RepackIndexHandle,
    /// State shared with the router
    pub state: Arc<AppState>,
    /// Temporary directory holding the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_index_config(IndexConfig::default())
    }

    pub fn with_index_config(index_config: IndexConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            index: index_config,
        };

        let store =
            Arc::new(SqliteRepackStore::new(&db_path).expect("Failed to create repack store"));
        let store_dyn: Arc<dyn RepackStore> = Arc::clone(&store) as Arc<dyn RepackStore>;

        let (index, worker) = create_index_service(Arc::clone(&store_dyn), &config.index);
        tokio::spawn(worker.run());

        let state = Arc::new(AppState::new(config, index.clone(), store_dyn));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            store,
            index,
            state,
            temp_dir,
        }
    }

    /// Insert a repack uploaded `upload_secs` after the epoch.
    pub fn insert(&self, title: &str, upload_secs: i64) {
        self.store
            .insert(&fixtures::new_repack(title, upload_secs))
            .expect("Failed to insert repack");
    }

    /// Serve the router on an ephemeral local port, for clients that need a
    /// real connection (WebSocket).
    pub async fn serve(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        addr
    }

    /// Make a GET request and parse the JSON body.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with an empty body.
    pub async fn post(&self, uri: &str) -> TestResponse {
        self.request(Request::post(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Make a GET request and return the raw body text.
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .expect("Request failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }
}
