//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use kindred_api::{AppState, build_app};
use kindred_cache::CacheManager;
use kindred_cache::memory::MemoryCacheProvider;
use kindred_core::config::AppConfig;
use kindred_core::traits::cache::CacheProvider;
use kindred_core::traits::clock::ManualClock;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Backing cache for direct inspection
    pub cache: Arc<dyn CacheProvider>,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a test application over a fresh in-memory cache
    pub fn new() -> Self {
        Self::with_cache(Arc::new(MemoryCacheProvider::new()))
    }

    /// Create a test application over the given cache backend
    pub fn with_cache(cache: Arc<dyn CacheProvider>) -> Self {
        let config = AppConfig::default();
        let manager = CacheManager::from_provider(
            Arc::clone(&cache),
            config.cache.operation_timeout(),
        );
        let clock = ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            chrono::Duration::seconds(1),
        );

        let state = AppState::new(config.clone(), manager, Arc::new(clock));

        Self {
            router: build_app(state),
            cache,
            config,
        }
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Register a device through the API
    pub async fn register(&self, user_id: &str, device_id: &str) -> TestResponse {
        self.request(
            "POST",
            &format!("/api/users/{user_id}/devices"),
            Some(serde_json::json!({
                "device_id": device_id,
                "refresh_token": format!("rt-{device_id}"),
            })),
        )
        .await
    }

    /// Device IDs currently listed for a user, most recent first
    pub async fn listed_devices(&self, user_id: &str) -> Vec<String> {
        let resp = self
            .request("GET", &format!("/api/users/{user_id}/devices"), None)
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        resp.body["devices"]
            .as_array()
            .expect("devices array")
            .iter()
            .map(|d| d["device_id"].as_str().expect("device_id").to_string())
            .collect()
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
