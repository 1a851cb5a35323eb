//! Device session handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use validator::Validate;

use crate::dto::request::RegisterDeviceRequest;
use crate::dto::response::{
    DeviceListResponse, DeviceResponse, RegisterDeviceResponse, RevokeDeviceResponse,
    RevokeOthersResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/users/{user_id}/devices
pub async fn register(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<Json<RegisterDeviceResponse>, ApiError> {
    req.validate()?;
    let outcome = state
        .device_store
        .register(&user_id, &req.device_id, &req.refresh_token)
        .await?;
    Ok(Json(outcome.into()))
}

/// GET /api/users/{user_id}/devices
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DeviceListResponse>, ApiError> {
    let devices = state.device_store.list_devices(&user_id).await?;
    Ok(Json(DeviceListResponse {
        devices: devices.into_iter().map(DeviceResponse::from).collect(),
    }))
}

/// POST /api/users/{user_id}/devices/{device_id}/validate
pub async fn validate(
    State(state): State<AppState>,
    Path((user_id, device_id)): Path<(String, String)>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let session = state
        .device_store
        .validate_device(&user_id, &device_id)
        .await?;
    Ok(Json(session.into()))
}

/// POST /api/users/{user_id}/devices/{device_id}/revoke-others
pub async fn revoke_others(
    State(state): State<AppState>,
    Path((user_id, device_id)): Path<(String, String)>,
) -> Result<Json<RevokeOthersResponse>, ApiError> {
    let revoked = state
        .device_store
        .revoke_other_devices(&user_id, &device_id)
        .await?;
    Ok(Json(RevokeOthersResponse { revoked }))
}

/// DELETE /api/users/{user_id}/devices/{device_id}
pub async fn revoke(
    State(state): State<AppState>,
    Path((user_id, device_id)): Path<(String, String)>,
) -> Result<Json<RevokeDeviceResponse>, ApiError> {
    let revoked = state
        .device_store
        .revoke_device(&user_id, &device_id)
        .await?;
    Ok(Json(RevokeDeviceResponse { revoked }))
}

/// DELETE /api/users/{user_id}/devices
pub async fn revoke_all(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.device_store.revoke_all_devices(&user_id).await?;
    Ok(StatusCode::OK)
}
