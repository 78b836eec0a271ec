//! Audit log endpoint handlers. Read-only: the trail is append-only and
//! entries are written by the operations themselves.

use axum::{
    extract::{Query, State},
    Json,
};

use domain::models::{AuditLogEntry, ListAuditLogsQuery};
use persistence::repositories::AuditLogRepository;
use shared::pagination::{Page, PageParams};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/v1/audit-logs
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<ListAuditLogsQuery>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<AuditLogEntry>>, ApiError> {
    let entries = AuditLogRepository::new(state.pool.clone())
        .list(&query, &page)
        .await?;
    Ok(Json(entries))
}
