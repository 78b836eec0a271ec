//! Employee endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::{ChangeSet, CreateEmployeeRequest, Employee, UpdateEmployeeRequest};
use domain::services::audit;
use persistence::repositories::EmployeeRepository;
use shared::pagination::{Page, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorIdentity;

use super::{check_deleted, record_audit};

/// Query parameters for employee listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEmployeesQuery {
    pub branch_id: Option<Uuid>,
    pub active: Option<bool>,
}

/// GET /api/v1/employees
pub async fn list_employees(
    State(state): State<AppState>,
    Query(filter): Query<ListEmployeesQuery>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<Employee>>, ApiError> {
    let employees = EmployeeRepository::new(state.pool.clone())
        .list(filter.branch_id, filter.active, &page)
        .await?;
    Ok(Json(employees))
}

/// POST /api/v1/employees
pub async fn create_employee(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    req.validate()?;

    let employee = EmployeeRepository::new(state.pool.clone())
        .create(&req)
        .await?;
    record_audit(
        &state.pool,
        audit::entity_created(
            &actor,
            audit::entity::EMPLOYEE,
            employee.id,
            &employee.full_name,
        ),
    )
    .await;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// GET /api/v1/employees/:id
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Employee>, ApiError> {
    let employee = EmployeeRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;
    Ok(Json(employee))
}

/// PUT /api/v1/employees/:id
pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, ApiError> {
    req.validate()?;

    let employee = EmployeeRepository::new(state.pool.clone())
        .update(id, &req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;
    record_audit(
        &state.pool,
        audit::entity_updated(
            &actor,
            audit::entity::EMPLOYEE,
            employee.id,
            ChangeSet::new(&employee.full_name),
        ),
    )
    .await;
    Ok(Json(employee))
}

/// DELETE /api/v1/employees/:id
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
) -> Result<StatusCode, ApiError> {
    let repo = EmployeeRepository::new(state.pool.clone());
    let employee = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    check_deleted(repo.delete(id).await?, "employee")?;
    record_audit(
        &state.pool,
        audit::entity_deleted(&actor, audit::entity::EMPLOYEE, id, &employee.full_name),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}
