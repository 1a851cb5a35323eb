//! Integration tests for the health check and outage handling.

mod helpers;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;

use kindred_core::error::AppError;
use kindred_core::result::AppResult;
use kindred_core::traits::cache::CacheProvider;

/// A cache whose every call fails as if the server were unreachable.
#[derive(Debug)]
struct UnreachableCache;

fn refused<T>() -> AppResult<T> {
    Err(AppError::store_unavailable("Connection refused"))
}

#[async_trait]
impl CacheProvider for UnreachableCache {
    async fn hget_all(&self, _key: &str) -> AppResult<HashMap<String, String>> {
        refused()
    }
    async fn hget(&self, _key: &str, _field: &str) -> AppResult<Option<String>> {
        refused()
    }
    async fn hset(&self, _key: &str, _field: &str, _value: &str) -> AppResult<()> {
        refused()
    }
    async fn hdel(&self, _key: &str, _field: &str) -> AppResult<bool> {
        refused()
    }
    async fn expire(&self, _key: &str, _ttl: Duration) -> AppResult<bool> {
        refused()
    }
    async fn ttl(&self, _key: &str) -> AppResult<Option<Duration>> {
        refused()
    }
    async fn delete(&self, _key: &str) -> AppResult<()> {
        refused()
    }
    async fn set_nx(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<bool> {
        refused()
    }
    async fn delete_if_equals(&self, _key: &str, _expected: &str) -> AppResult<bool> {
        refused()
    }
    async fn expire_if_equals(&self, _key: &str, _expected: &str, _ttl: Duration) -> AppResult<bool> {
        refused()
    }
    async fn health_check(&self) -> AppResult<bool> {
        refused()
    }
}

#[tokio::test]
async fn test_health_ok_with_memory_cache() {
    let app = helpers::TestApp::new();

    let resp = app.request("GET", "/api/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "ok");
    assert_eq!(resp.body["cache"], "connected");
}

#[tokio::test]
async fn test_health_degraded_when_cache_is_down() {
    let app = helpers::TestApp::with_cache(Arc::new(UnreachableCache));

    let resp = app.request("GET", "/api/health", None).await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.body["status"], "degraded");
}

#[tokio::test]
async fn test_outage_maps_to_service_unavailable() {
    let app = helpers::TestApp::with_cache(Arc::new(UnreachableCache));

    let resp = app.register("u1", "phone").await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.body["error"], "STORE_UNAVAILABLE");

    let resp = app
        .request("POST", "/api/users/u1/devices/phone/validate", None)
        .await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);

    let resp = app
        .request("POST", "/api/users/u1/devices/phone/revoke-others", None)
        .await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
}
