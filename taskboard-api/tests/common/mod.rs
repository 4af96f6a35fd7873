//! Common test utilities for integration tests
//!
//! Builds the full router over an in-memory store, so tests need no database.
//! Users are registered through the API itself, which also exercises
//! password hashing and token issuance.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::{ApiConfig, BoardConfig, Config, DatabaseConfig, JwtConfig};
use taskboard_shared::store::Stores;
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-that-is-at-least-32-chars";
pub const TEST_PASSWORD: &str = "launch2024";

/// Test context holding the router and its stores
pub struct TestContext {
    pub stores: Stores,
    pub app: axum::Router,
    pub config: Config,
}

/// A registered user and their bearer token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestUser {
    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub fn test_config(strict_status: bool) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            ttl_days: 1,
        },
        board: BoardConfig { strict_status },
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config(false))
    }

    pub fn with_config(config: Config) -> Self {
        let stores = Stores::in_memory();
        let state = AppState::new(stores.clone(), config.clone());

        TestContext {
            stores,
            app: build_router(state),
            config,
        }
    }

    /// Sends a request and returns status plus JSON body (Null when empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user) = user {
            builder = builder.header("authorization", user.auth_header());
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Registers a user through the API
    pub async fn register(&self, name: &str) -> TestUser {
        let email = format!("{}@example.com", name.to_lowercase());

        let (status, body) = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": TEST_PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["id"].as_str().unwrap().to_string(),
            email,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project through the API and returns its ID
    pub async fn create_project(&self, owner: &TestUser, name: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/projects",
                Some(owner),
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);

        body["id"].as_str().unwrap().to_string()
    }
}
