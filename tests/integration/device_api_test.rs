//! Integration tests for the device session endpoints.

mod helpers;

use axum::http::StatusCode;

use kindred_cache::keys;
use kindred_core::traits::cache::CacheProvider;

#[tokio::test]
async fn test_register_and_list() {
    let app = helpers::TestApp::new();

    let resp = app.register("u1", "phone").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["evicted"], serde_json::json!([]));
    assert_eq!(resp.body["replaced"], false);

    app.register("u1", "laptop").await;
    assert_eq!(app.listed_devices("u1").await, vec!["laptop", "phone"]);
}

#[tokio::test]
async fn test_listing_never_exposes_tokens() {
    let app = helpers::TestApp::new();
    app.register("u1", "phone").await;

    let resp = app.request("GET", "/api/users/u1/devices", None).await;
    let device = &resp.body["devices"][0];
    assert!(device.get("refresh_token").is_none());
    assert!(device["last_access"].is_string());
}

#[tokio::test]
async fn test_sixth_login_evicts_least_recent() {
    let app = helpers::TestApp::new();
    for device in ["A", "B", "C", "D", "E"] {
        assert_eq!(app.register("u1", device).await.status, StatusCode::OK);
    }

    let resp = app.register("u1", "F").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["evicted"], serde_json::json!(["A"]));

    let mut devices = app.listed_devices("u1").await;
    devices.sort();
    assert_eq!(devices, vec!["B", "C", "D", "E", "F"]);

    let resp = app
        .request("POST", "/api/users/u1/devices/A/validate", None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "INVALID_DEVICE");
}

#[tokio::test]
async fn test_validate_known_device() {
    let app = helpers::TestApp::new();
    app.register("u1", "phone").await;

    let resp = app
        .request("POST", "/api/users/u1/devices/phone/validate", None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["device_id"], "phone");

    let stored = app
        .cache
        .hget(&keys::user_devices("u1"), "phone")
        .await
        .unwrap()
        .unwrap();
    let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored["refreshToken"], "rt-phone");
}

#[tokio::test]
async fn test_validate_unknown_device_is_unauthorized() {
    let app = helpers::TestApp::new();
    app.register("u1", "phone").await;

    let resp = app
        .request("POST", "/api/users/u1/devices/Z/validate", None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "INVALID_DEVICE");
    assert!(resp.body["message"].is_string());
    assert_eq!(app.listed_devices("u1").await, vec!["phone"]);
}

#[tokio::test]
async fn test_revoke_others() {
    let app = helpers::TestApp::new();
    for device in ["B", "C", "D", "E", "F"] {
        app.register("u1", device).await;
    }

    let resp = app
        .request("POST", "/api/users/u1/devices/C/revoke-others", None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["revoked"], 4);
    assert_eq!(app.listed_devices("u1").await, vec!["C"]);

    let resp = app
        .request("POST", "/api/users/u1/devices/C/validate", None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_revoke_single_device() {
    let app = helpers::TestApp::new();
    app.register("u1", "phone").await;
    app.register("u1", "tablet").await;

    let resp = app.request("DELETE", "/api/users/u1/devices/phone", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["revoked"], true);

    let resp = app.request("DELETE", "/api/users/u1/devices/phone", None).await;
    assert_eq!(resp.body["revoked"], false);
    assert_eq!(app.listed_devices("u1").await, vec!["tablet"]);
}

#[tokio::test]
async fn test_revoke_all_devices() {
    let app = helpers::TestApp::new();
    app.register("u1", "phone").await;
    app.register("u1", "tablet").await;

    let resp = app.request("DELETE", "/api/users/u1/devices", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(app.listed_devices("u1").await.is_empty());
}

#[tokio::test]
async fn test_blank_registration_is_rejected() {
    let app = helpers::TestApp::new();

    let resp = app
        .request(
            "POST",
            "/api/users/u1/devices",
            Some(serde_json::json!({ "device_id": "", "refresh_token": "rt" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "VALIDATION_ERROR");

    let resp = app
        .request(
            "POST",
            "/api/users/u1/devices",
            Some(serde_json::json!({ "device_id": "   ", "refresh_token": "rt" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(app.listed_devices("u1").await.is_empty());
}

#[tokio::test]
async fn test_users_do_not_share_devices() {
    let app = helpers::TestApp::new();
    app.register("alice", "phone").await;

    let resp = app
        .request("POST", "/api/users/bob/devices/phone/validate", None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
