//! Common test utilities for perk-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;

use perk_ledger::BcryptHasher;
use perk_service::{create_router, AppState, ServiceConfig};
use perk_store::{MemoryStore, Store};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct handle to the in-memory store for assertions.
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory store.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());

        let config = ServiceConfig {
            jwt_secret: "test-secret".into(),
            ..ServiceConfig::default()
        };

        // Minimum bcrypt cost (4) keeps the auth tests fast.
        let hasher = Arc::new(BcryptHasher::with_cost(4));

        let state = AppState::new(
            Arc::clone(&store) as Arc<dyn Store>,
            hasher,
            config,
        );
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, store }
    }

    /// Authenticate `username`, provisioning the account, and return the
    /// bearer token.
    pub async fn authenticate(&self, username: &str, password: &str) -> String {
        let response = self
            .server
            .post("/api/auth")
            .json(&serde_json::json!({
                "username": username,
                "password": password
            }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        format!("Bearer {}", body["token"].as_str().expect("token missing"))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
