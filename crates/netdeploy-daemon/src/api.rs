//! REST API handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use netdeploy_core::{DeviceDescriptor, DeviceNode, DeviceType, ErrorClass, RegistryError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::state::AppState;
use crate::validate::validate_mac;

/// Request failure, rendered as a problem detail
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or incomplete input; never reaches the registry
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Registry(err) => match err.class() {
                ErrorClass::Conflict => StatusCode::BAD_REQUEST,
                ErrorClass::Emptiness => StatusCode::NOT_FOUND,
                // A missing uplink is a bad argument; a missing target is not found
                ErrorClass::Reference => match err {
                    RegistryError::UplinkNotFound(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::NOT_FOUND,
                },
            },
        }
    }
}

/// RFC 7807 problem detail body
#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self, "Request rejected");

        let body = ProblemDetail {
            kind: "about:blank".to_string(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail: self.to_string(),
        };
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(body),
        )
            .into_response()
    }
}

/// Create device request body
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub device_type: Option<DeviceType>,
    pub mac_address: Option<String>,
    pub uplink_mac_address: Option<String>,
}

/// Register a device in the deployment
pub async fn register_device(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterDeviceRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let device_type = req
        .device_type
        .ok_or_else(|| ApiError::Validation("Device type cannot be null".to_string()))?;
    let mac_address = req
        .mac_address
        .ok_or_else(|| ApiError::Validation("MAC address cannot be null".to_string()))?;
    validate_mac(&mac_address)?;
    if let Some(uplink) = &req.uplink_mac_address {
        validate_mac(uplink)?;
    }

    state
        .register(device_type, &mac_address, req.uplink_mac_address.as_deref())
        .await?;

    info!(
        mac = %mac_address,
        device_type = %device_type,
        uplink = ?req.uplink_mac_address,
        "Device registered"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// List all devices
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<Vec<DeviceDescriptor>> {
    let devices = state.devices().await;
    debug!(count = devices.len(), "Listing devices");
    Json(devices)
}

/// Get a specific device by MAC address
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(mac_address): Path<String>,
) -> Result<Json<DeviceDescriptor>, ApiError> {
    validate_mac(&mac_address)?;
    Ok(Json(state.get_device(&mac_address).await?))
}

/// Get the whole deployment tree
pub async fn get_tree(State(state): State<Arc<AppState>>) -> Result<Json<DeviceNode>, ApiError> {
    let tree = state.device_tree().await?;
    debug!(root = %tree.mac_address, devices = tree.device_count(), "Built device tree");
    Ok(Json(tree))
}

/// Get the subtree below a device
pub async fn get_subtree(
    State(state): State<Arc<AppState>>,
    Path(mac_address): Path<String>,
) -> Result<Json<DeviceNode>, ApiError> {
    validate_mac(&mac_address)?;
    let subtree = state.device_subtree(&mac_address).await?;
    debug!(root = %subtree.mac_address, devices = subtree.device_count(), "Built device subtree");
    Ok(Json(subtree))
}

/// Liveness check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "devices": state.device_count().await,
    }))
}
