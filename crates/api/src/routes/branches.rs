//! Branch endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::{Branch, ChangeSet, CreateBranchRequest, UpdateBranchRequest};
use domain::services::audit;
use persistence::repositories::BranchRepository;
use shared::pagination::{Page, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorIdentity;

use super::{check_deleted, record_audit};

/// GET /api/v1/branches
pub async fn list_branches(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<Branch>>, ApiError> {
    let branches = BranchRepository::new(state.pool.clone())
        .list(&page)
        .await?;
    Ok(Json(branches))
}

/// POST /api/v1/branches
pub async fn create_branch(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<CreateBranchRequest>,
) -> Result<(StatusCode, Json<Branch>), ApiError> {
    req.validate()?;

    let branch = BranchRepository::new(state.pool.clone()).create(&req).await?;
    record_audit(
        &state.pool,
        audit::entity_created(&actor, audit::entity::BRANCH, branch.id, &branch.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(branch)))
}

/// GET /api/v1/branches/:id
pub async fn get_branch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Branch>, ApiError> {
    let branch = BranchRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Branch not found".into()))?;
    Ok(Json(branch))
}

/// PUT /api/v1/branches/:id
pub async fn update_branch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<UpdateBranchRequest>,
) -> Result<Json<Branch>, ApiError> {
    req.validate()?;

    let branch = BranchRepository::new(state.pool.clone())
        .update(id, &req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Branch not found".into()))?;
    record_audit(
        &state.pool,
        audit::entity_updated(
            &actor,
            audit::entity::BRANCH,
            branch.id,
            ChangeSet::new(&branch.name),
        ),
    )
    .await;
    Ok(Json(branch))
}

/// DELETE /api/v1/branches/:id
pub async fn delete_branch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ActorIdentity(actor): ActorIdentity,
) -> Result<StatusCode, ApiError> {
    let repo = BranchRepository::new(state.pool.clone());
    let branch = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Branch not found".into()))?;

    check_deleted(repo.delete(id).await?, "branch")?;
    record_audit(
        &state.pool,
        audit::entity_deleted(&actor, audit::entity::BRANCH, id, &branch.name),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}
