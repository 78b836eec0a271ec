//! HTTP route handlers.

pub mod assignments;
pub mod audit_logs;
pub mod branches;
pub mod devices;
pub mod employees;
pub mod health;
pub mod requests;
pub mod returns;

use sqlx::PgPool;
use tracing::warn;

use domain::models::CreateAuditLogInput;
use persistence::repositories::{AuditLogRepository, DeleteOutcome};

use crate::error::ApiError;

/// Appends a CRUD audit entry. Failures are logged and swallowed: the audit
/// trail never blocks the response.
pub(crate) async fn record_audit(pool: &PgPool, input: CreateAuditLogInput) {
    if let Err(err) = AuditLogRepository::new(pool.clone()).insert(&input).await {
        warn!(
            error = %err,
            entity_type = %input.entity_type,
            entity_id = %input.entity_id,
            "failed to append audit entry"
        );
    }
}

/// Maps a protected-delete outcome onto the HTTP result.
pub(crate) fn check_deleted(outcome: DeleteOutcome, entity: &str) -> Result<(), ApiError> {
    match outcome {
        DeleteOutcome::Deleted => Ok(()),
        DeleteOutcome::NotFound => Err(ApiError::NotFound(format!("{entity} not found"))),
        DeleteOutcome::Blocked {
            dependents,
            dependent_kind,
        } => Err(ApiError::Conflict(format!(
            "Cannot delete {entity}: {dependents} {dependent_kind} reference it"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_deleted_outcomes() {
        assert!(check_deleted(DeleteOutcome::Deleted, "branch").is_ok());
        assert!(matches!(
            check_deleted(DeleteOutcome::NotFound, "branch"),
            Err(ApiError::NotFound(_))
        ));
        let blocked = check_deleted(
            DeleteOutcome::Blocked {
                dependents: 3,
                dependent_kind: "devices or employees",
            },
            "branch",
        );
        match blocked {
            Err(ApiError::Conflict(msg)) => {
                assert!(msg.contains("3 devices or employees"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
