//! Assignment endpoint handlers.
//!
//! Creation, letter signature and return filing run through the lifecycle
//! repository so the cascade side effects stay transactional.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    Assignment, AssignmentStatus, ChangeSet, CreateAssignmentRequest, CreateReturnRequest,
    Device, DeviceCondition, ReturnRecord, UpdateAssignmentRequest,
};
use domain::services::audit;
use persistence::repositories::{AssignmentRepository, DeviceRepository, LifecycleRepository};
use shared::pagination::{Page, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorIdentity;
use crate::middleware::record_lifecycle_operation;

use super::record_audit;

/// Query parameters for assignment listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssignmentsQuery {
    pub employee_id: Option<Uuid>,
    pub device_id: Option<Uuid>,
    pub status: Option<AssignmentStatus>,
}

/// Body for filing a return against an assignment in the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReturnBody {
    pub return_date: NaiveDate,
    pub condition: DeviceCondition,
    pub notes: Option<String>,
}

/// GET /api/v1/assignments
pub async fn list_assignments(
    State(state): State<AppState>,
    Query(query): Query<ListAssignmentsQuery>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<Assignment>>, ApiError> {
    let assignments = AssignmentRepository::new(state.pool.clone())
        .list(query.employee_id, query.device_id, query.status, &page)
        .await?;
    Ok(Json(assignments))
}

/// POST /api/v1/assignments
///
/// Creates the assignment, flips the device to `ASIGNADO` and completes a
/// referenced `PENDIENTE` request, all in one transaction.
pub async fn create_assignment(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<Assignment>), ApiError> {
    req.validate()?;

    let assignment = LifecycleRepository::new(state.pool.clone())
        .create_assignment(&req, &actor)
        .await?;
    record_lifecycle_operation("assignment_created");
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Assignment detail payload with the device label resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    #[serde(flatten)]
    pub assignment: Assignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_label: Option<String>,
}

/// The device label from the live row, falling back to the snapshot embedded
/// at loss time when the device has left the catalog.
fn resolve_device_label(live: Option<&Device>, assignment: &Assignment) -> Option<String> {
    live.map(Device::label)
        .or_else(|| assignment.device_snapshot().map(|s| s.label()))
}

/// GET /api/v1/assignments/:id
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let assignment = AssignmentRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".into()))?;
    let device = DeviceRepository::new(state.pool.clone())
        .find_by_id(assignment.device_id)
        .await?;
    let device_label = resolve_device_label(device.as_ref(), &assignment);
    Ok(Json(AssignmentResponse {
        assignment,
        device_label,
    }))
}

/// PUT /api/v1/assignments/:id
///
/// A `FINALIZADA` assignment accepts only notes edits.
pub async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<UpdateAssignmentRequest>,
) -> Result<Json<Assignment>, ApiError> {
    req.validate()?;

    let repo = AssignmentRepository::new(state.pool.clone());
    let existing = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".into()))?;

    if !existing.is_active() && req.touches_locked_fields() {
        return Err(ApiError::Conflict(
            "A finalized assignment accepts only notes edits".into(),
        ));
    }

    let assignment = repo
        .update(id, &req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".into()))?;
    record_audit(
        &state.pool,
        audit::entity_updated(
            &actor,
            audit::entity::ASSIGNMENT,
            assignment.id,
            ChangeSet::new(format!("Assignment {}", assignment.id)),
        ),
    )
    .await;
    Ok(Json(assignment))
}

/// POST /api/v1/assignments/:id/sign-letter
pub async fn sign_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
) -> Result<Json<Assignment>, ApiError> {
    let assignment = LifecycleRepository::new(state.pool.clone())
        .sign_letter(id, &actor)
        .await?;
    record_lifecycle_operation("letter_signed");
    Ok(Json(assignment))
}

/// POST /api/v1/assignments/:id/return
///
/// Path-addressed variant of return filing.
pub async fn file_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
    Json(body): Json<FileReturnBody>,
) -> Result<(StatusCode, Json<ReturnRecord>), ApiError> {
    let req = CreateReturnRequest {
        assignment_id: id,
        return_date: body.return_date,
        condition: body.condition,
        notes: body.notes,
    };
    req.validate()?;

    let return_record = LifecycleRepository::new(state.pool.clone())
        .create_return(&req, &actor)
        .await?;
    record_lifecycle_operation("return_filed");
    Ok((StatusCode::CREATED, Json(return_record)))
}
