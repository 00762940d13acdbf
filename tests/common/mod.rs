//! Test helpers for the London Travel site API integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use http_body_util::BodyExt;
use london_travel_site::{
    build_router,
    config::{
        DatabaseConfig, Environment, SecurityConfig, SiteConfig, SwaggerConfig, TelemetryConfig,
    },
    error::AppError,
    models::TravelUser,
    services::{metrics, UserStore},
    AppState,
};

pub const TEST_ADMIN_API_KEY: &str = "test-admin-key-12345";

/// In-memory user directory standing in for PostgreSQL.
pub struct InMemoryUserStore {
    users: Vec<TravelUser>,
    pub lookups: AtomicUsize,
    fail: bool,
}

impl InMemoryUserStore {
    pub fn new(users: Vec<TravelUser>) -> Arc<Self> {
        Arc::new(Self {
            users,
            lookups: AtomicUsize::new(0),
            fail: false,
        })
    }

    /// A store whose lookup always fails, simulating a data-layer outage.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            users: Vec::new(),
            lookups: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_alexa_token(&self, token: &str) -> Result<Option<TravelUser>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "user store is offline"
            )));
        }

        Ok(self
            .users
            .iter()
            .find(|u| u.alexa_token.as_deref() == Some(token))
            .cloned())
    }

    async fn count(&self) -> Result<u64, AppError> {
        if self.fail {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "user store is offline"
            )));
        }
        Ok(self.users.len() as u64)
    }
}

/// A store that matches tokens case-insensitively, violating the exact-match
/// contract. Exercises the gate's defensive re-comparison.
pub struct LooseMatchStore {
    user: TravelUser,
}

impl LooseMatchStore {
    pub fn new(user: TravelUser) -> Arc<Self> {
        Arc::new(Self { user })
    }
}

#[async_trait]
impl UserStore for LooseMatchStore {
    async fn find_by_alexa_token(&self, token: &str) -> Result<Option<TravelUser>, AppError> {
        let stored = self.user.alexa_token.as_deref().unwrap_or_default();
        if stored.eq_ignore_ascii_case(token) {
            Ok(Some(self.user.clone()))
        } else {
            Ok(None)
        }
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(1)
    }
}

pub fn test_config() -> SiteConfig {
    SiteConfig {
        environment: Environment::Dev,
        service_name: "london-travel-site-test".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "error".to_string(),
        port: 0,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            admin_api_key: TEST_ADMIN_API_KEY.to_string(),
        },
        telemetry: TelemetryConfig {
            otlp_endpoint: "http://telemetry.invalid:4317".to_string(),
            ingestion_hosts: vec!["telemetry.invalid".to_string()],
        },
        swagger: SwaggerConfig { enabled: false },
    }
}

/// Build the application router over the given store, with metrics ready.
pub fn test_app(users: Arc<dyn UserStore>) -> Router {
    metrics::init_metrics();

    let state = AppState {
        config: test_config(),
        users,
    };

    build_router(state).expect("failed to build router")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response body was not JSON")
}
