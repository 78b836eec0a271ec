//! Device request endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    ChangeSet, CreateDeviceRequestPayload, DeviceRequest, RequestStatus, UpdateDeviceRequestPayload,
};
use domain::services::audit;
use persistence::repositories::DeviceRequestRepository;
use shared::pagination::{Page, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorIdentity;

use super::{check_deleted, record_audit};

/// Query parameters for request listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsQuery {
    pub status: Option<RequestStatus>,
    pub employee_id: Option<Uuid>,
}

/// GET /api/v1/requests
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListRequestsQuery>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<DeviceRequest>>, ApiError> {
    let requests = DeviceRequestRepository::new(state.pool.clone())
        .list(query.status, query.employee_id, &page)
        .await?;
    Ok(Json(requests))
}

/// POST /api/v1/requests
pub async fn create_request(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<CreateDeviceRequestPayload>,
) -> Result<(StatusCode, Json<DeviceRequest>), ApiError> {
    req.validate()?;

    let request = DeviceRequestRepository::new(state.pool.clone())
        .create(&req, actor.id)
        .await?;
    record_audit(
        &state.pool,
        audit::entity_created(
            &actor,
            audit::entity::DEVICE_REQUEST,
            request.id,
            &format!("{} request for {}", request.reason, request.device_type),
        ),
    )
    .await;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/v1/requests/:id
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeviceRequest>, ApiError> {
    let request = DeviceRequestRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device request not found".into()))?;
    Ok(Json(request))
}

/// PUT /api/v1/requests/:id
///
/// A `COMPLETADA` request accepts only justification edits; status and
/// requesting manager are frozen.
pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<UpdateDeviceRequestPayload>,
) -> Result<Json<DeviceRequest>, ApiError> {
    req.validate()?;

    let repo = DeviceRequestRepository::new(state.pool.clone());
    let existing = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device request not found".into()))?;

    if existing.is_locked() && req.touches_locked_fields() {
        return Err(ApiError::Conflict(
            "A completed request accepts only justification edits".into(),
        ));
    }
    // COMPLETADA is reached only through assignment creation.
    if req.status == Some(RequestStatus::Completada) {
        return Err(ApiError::Conflict(
            "Requests are completed automatically by assignment creation".into(),
        ));
    }

    let request = repo
        .update(id, &req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device request not found".into()))?;
    record_audit(
        &state.pool,
        audit::entity_updated(
            &actor,
            audit::entity::DEVICE_REQUEST,
            request.id,
            ChangeSet::new(format!("DeviceRequest {}", request.id)),
        ),
    )
    .await;
    Ok(Json(request))
}

/// DELETE /api/v1/requests/:id
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
) -> Result<StatusCode, ApiError> {
    let repo = DeviceRequestRepository::new(state.pool.clone());
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device request not found".into()))?;

    check_deleted(repo.delete(id).await?, "device request")?;
    record_audit(
        &state.pool,
        audit::entity_deleted(
            &actor,
            audit::entity::DEVICE_REQUEST,
            id,
            &format!("DeviceRequest {id}"),
        ),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}
