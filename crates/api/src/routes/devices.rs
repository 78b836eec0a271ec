//! Device endpoint handlers.
//!
//! Responses carry the catalog row plus the computed current value and age,
//! evaluated against today's date at request time.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    ChangeDeviceStatusRequest, ChangeSet, CreateDeviceRequest, Device, DeviceStatus, DeviceType,
    MarkDeviceLostRequest, MarkDeviceRetiredRequest, UpdateDeviceRequest,
};
use domain::services::{audit, depreciation};
use persistence::repositories::{DeviceFilter, DeviceRepository, LifecycleRepository};
use shared::pagination::{Page, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorIdentity;
use crate::middleware::record_lifecycle_operation;

use super::{check_deleted, record_audit};

/// A device with its computed value fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    #[serde(flatten)]
    pub device: Device,

    /// Depreciated value as of today. Absent for non-value-tracked types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<Decimal>,

    /// Age in whole years, capped at "5+". Absent for non-value-tracked types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
}

impl DeviceResponse {
    fn new(device: Device, today: NaiveDate) -> Self {
        let current_value = depreciation::depreciated_value_for_type(
            device.device_type,
            device.initial_value,
            Some(device.intake_date),
            today,
            device.manual_value,
            device.depreciated_value,
        );
        let age = device
            .device_type
            .is_value_tracked()
            .then(|| depreciation::age_display(device.intake_date, today));
        Self {
            device,
            current_value,
            age,
        }
    }
}

/// Query parameters for device listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDevicesQuery {
    pub status: Option<DeviceStatus>,
    pub device_type: Option<DeviceType>,
    pub branch_id: Option<Uuid>,
    pub search: Option<String>,
}

impl ListDevicesQuery {
    fn into_filter(self) -> DeviceFilter {
        DeviceFilter {
            status: self.status,
            device_type: self.device_type,
            branch_id: self.branch_id,
            search: self.search,
        }
    }
}

/// Device counts for the stats endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatsResponse {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_type: BTreeMap<String, i64>,
}

/// GET /api/v1/devices
pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<ListDevicesQuery>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<DeviceResponse>>, ApiError> {
    let today = Utc::now().date_naive();
    let devices = DeviceRepository::new(state.pool.clone())
        .list(&query.into_filter(), &page)
        .await?;

    let page = Page {
        data: devices
            .data
            .into_iter()
            .map(|d| DeviceResponse::new(d, today))
            .collect(),
        pagination: devices.pagination,
    };
    Ok(Json(page))
}

/// GET /api/v1/devices/stats
pub async fn device_stats(
    State(state): State<AppState>,
) -> Result<Json<DeviceStatsResponse>, ApiError> {
    let repo = DeviceRepository::new(state.pool.clone());
    let by_status: BTreeMap<String, i64> = repo.counts_by_status().await?.into_iter().collect();
    let by_type: BTreeMap<String, i64> = repo.counts_by_type().await?.into_iter().collect();
    let total = by_status.values().sum();

    Ok(Json(DeviceStatsResponse {
        total,
        by_status,
        by_type,
    }))
}

/// POST /api/v1/devices
pub async fn create_device(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceResponse>), ApiError> {
    req.validate_payload()?;

    let today = Utc::now().date_naive();
    let initial_depreciated = depreciation::depreciated_value_for_type(
        req.device_type,
        req.initial_value,
        Some(req.intake_date),
        today,
        false,
        None,
    );

    let device = DeviceRepository::new(state.pool.clone())
        .create(&req, initial_depreciated, actor.id)
        .await?;
    record_audit(
        &state.pool,
        audit::entity_created(&actor, audit::entity::DEVICE, device.id, &device.label()),
    )
    .await;
    Ok((StatusCode::CREATED, Json(DeviceResponse::new(device, today))))
}

/// GET /api/v1/devices/:id
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = DeviceRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device not found".into()))?;
    Ok(Json(DeviceResponse::new(device, Utc::now().date_naive())))
}

/// PUT /api/v1/devices/:id
///
/// Supplying `depreciatedValue` switches the device to a manual value;
/// otherwise the stored value is refreshed from the (possibly updated)
/// initial value.
pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<UpdateDeviceRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    req.validate()?;

    let repo = DeviceRepository::new(state.pool.clone());
    let existing = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device not found".into()))?;

    let today = Utc::now().date_naive();
    let recalculated = if req.depreciated_value.is_none() && !existing.manual_value {
        depreciation::depreciated_value_for_type(
            existing.device_type,
            req.initial_value.or(existing.initial_value),
            Some(existing.intake_date),
            today,
            false,
            None,
        )
    } else {
        None
    };

    let device = repo
        .update(id, &req, recalculated)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device not found".into()))?;
    record_audit(
        &state.pool,
        audit::entity_updated(
            &actor,
            audit::entity::DEVICE,
            device.id,
            ChangeSet::new(device.label()),
        ),
    )
    .await;
    Ok(Json(DeviceResponse::new(device, today)))
}

/// DELETE /api/v1/devices/:id
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
) -> Result<StatusCode, ApiError> {
    let repo = DeviceRepository::new(state.pool.clone());
    let device = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device not found".into()))?;

    check_deleted(repo.delete(id).await?, "device")?;
    record_audit(
        &state.pool,
        audit::entity_deleted(&actor, audit::entity::DEVICE, id, &device.label()),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/devices/:id/change-status
pub async fn change_device_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<ChangeDeviceStatusRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = LifecycleRepository::new(state.pool.clone())
        .change_device_status(id, req.status, &actor)
        .await?;
    record_lifecycle_operation("change_status");
    Ok(Json(DeviceResponse::new(device, Utc::now().date_naive())))
}

/// POST /api/v1/devices/:id/mark-lost
///
/// Flips the device to `ROBO`, snapshots it into the active assignment's
/// discount data and finalizes that assignment.
pub async fn mark_device_lost(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<MarkDeviceLostRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    req.validate()?;

    let device = LifecycleRepository::new(state.pool.clone())
        .mark_device_lost(id, &req, &actor)
        .await?;
    record_lifecycle_operation("mark_lost");
    Ok(Json(DeviceResponse::new(device, Utc::now().date_naive())))
}

/// POST /api/v1/devices/:id/mark-retired
///
/// Flips the device to `BAJA`, finalizing any active assignment. Idempotent
/// for already-retired devices.
pub async fn mark_device_retired(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<MarkDeviceRetiredRequest>,
) -> Result<Json<DeviceResponse>, ApiError> {
    req.validate()?;

    let device = LifecycleRepository::new(state.pool.clone())
        .mark_device_retired(id, &req, &actor)
        .await?;
    record_lifecycle_operation("mark_retired");
    Ok(Json(DeviceResponse::new(device, Utc::now().date_naive())))
}
