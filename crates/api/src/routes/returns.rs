//! Return endpoint handlers.
//!
//! Returns are immutable: create (through the lifecycle repository) and read
//! only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::{CreateReturnRequest, ReturnRecord};
use persistence::repositories::{LifecycleRepository, ReturnRepository};
use shared::pagination::{Page, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorIdentity;
use crate::middleware::record_lifecycle_operation;

/// GET /api/v1/returns
pub async fn list_returns(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<ReturnRecord>>, ApiError> {
    let returns = ReturnRepository::new(state.pool.clone()).list(&page).await?;
    Ok(Json(returns))
}

/// POST /api/v1/returns
pub async fn create_return(
    State(state): State<AppState>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<CreateReturnRequest>,
) -> Result<(StatusCode, Json<ReturnRecord>), ApiError> {
    req.validate()?;

    let return_record = LifecycleRepository::new(state.pool.clone())
        .create_return(&req, &actor)
        .await?;
    record_lifecycle_operation("return_filed");
    Ok((StatusCode::CREATED, Json(return_record)))
}

/// GET /api/v1/returns/:id
pub async fn get_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReturnRecord>, ApiError> {
    let return_record = ReturnRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Return not found".into()))?;
    Ok(Json(return_record))
}
