//! Transactional lifecycle dispatcher.
//!
//! Executes the cascades planned by `domain::services::cascade` as single
//! transactions. The device row is locked with `SELECT ... FOR UPDATE` before
//! preconditions are evaluated, so two concurrent operations on the same
//! device serialize and the loser re-checks against committed state. The
//! device row is always locked before the assignment row.
//!
//! Audit entries are appended inside the transaction but behind a savepoint:
//! an audit insert failure is logged and the business change still commits.

use chrono::Utc;
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use domain::models::{
    Actor, Assignment, CreateAssignmentRequest, CreateReturnRequest, Device, DeviceStatus,
    LetterStatus, MarkDeviceLostRequest, MarkDeviceRetiredRequest, RequestStatus, ReturnRecord,
};
use domain::services::audit;
use domain::services::cascade::{
    plan_assignment_creation, plan_device_loss, plan_device_retirement, plan_letter_signature,
    plan_return_creation, FinalizeAssignment, LifecycleError, ReturnContext,
};
use domain::services::status_machine::{plan_status_change, TransitionError};

use crate::entities::{AssignmentEntity, DeviceEntity, ReturnEntity};
use crate::metrics::QueryTimer;
use crate::repositories::assignment::ASSIGNMENT_COLUMNS;
use crate::repositories::device::DEVICE_COLUMNS;
use crate::repositories::AuditLogRepository;

/// Failures of a lifecycle operation.
#[derive(Debug, Error)]
pub enum LifecycleRepoError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl From<TransitionError> for LifecycleRepoError {
    fn from(err: TransitionError) -> Self {
        LifecycleRepoError::Lifecycle(err.into())
    }
}

#[derive(Clone)]
pub struct LifecycleRepository {
    pool: PgPool,
}

impl LifecycleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates an assignment, flips the device to `ASIGNADO` and completes a
    /// referenced `PENDIENTE` request, all in one transaction.
    pub async fn create_assignment(
        &self,
        req: &CreateAssignmentRequest,
        actor: &Actor,
    ) -> Result<Assignment, LifecycleRepoError> {
        let timer = QueryTimer::new("create_assignment");
        let mut tx = self.pool.begin().await?;

        let device = lock_device(&mut tx, req.device_id)
            .await?
            .ok_or(LifecycleRepoError::NotFound("device"))?;
        let active_count = count_active_assignments(&mut tx, device.id).await?;

        let request = match req.request_id {
            Some(request_id) => Some(
                lock_request_status(&mut tx, request_id)
                    .await?
                    .ok_or(LifecycleRepoError::NotFound("device request"))?,
            ),
            None => None,
        };
        let request_status: Option<RequestStatus> = request
            .as_deref()
            .map(|s| s.parse().map_err(crate::entities::decode_err))
            .transpose()?;

        let plan =
            plan_assignment_creation(device.id, device.status, active_count > 0, request_status)?;

        let entity = sqlx::query_as::<_, AssignmentEntity>(&format!(
            r#"
            INSERT INTO assignments (request_id, employee_id, device_id, delivery_type,
                                     delivery_date, letter_status, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(req.request_id)
        .bind(req.employee_id)
        .bind(req.device_id)
        .bind(req.delivery_type.to_string())
        .bind(req.delivery_date)
        .bind(req.letter_status.to_string())
        .bind(&req.notes)
        .bind(actor.id)
        .fetch_one(&mut *tx)
        .await?;
        let assignment = entity.into_domain()?;

        if let Some(transition) = plan.device_transition {
            set_device_status(&mut tx, device.id, transition.to).await?;
            record_audit(
                &mut tx,
                audit::device_status_changed(actor, &device, transition, None),
            )
            .await;
        }
        if let Some(status) = plan.skipped_terminal_status {
            warn!(
                device_id = %device.id,
                context = %audit::terminal_skip_context(status),
                "assignment created against a device in a terminal state"
            );
        }
        if plan.complete_request {
            if let (Some(request_id), Some(previous)) = (req.request_id, request_status) {
                complete_request(&mut tx, request_id).await?;
                record_audit(&mut tx, audit::request_completed(actor, request_id, previous))
                    .await;
            }
        }
        record_audit(
            &mut tx,
            audit::entity_created(
                actor,
                audit::entity::ASSIGNMENT,
                assignment.id,
                &format!("Assignment {}", assignment.id),
            ),
        )
        .await;

        tx.commit().await?;
        timer.record();
        Ok(assignment)
    }

    /// Files a return, finalizes the assignment and routes the device by the
    /// returned condition.
    pub async fn create_return(
        &self,
        req: &CreateReturnRequest,
        actor: &Actor,
    ) -> Result<ReturnRecord, LifecycleRepoError> {
        let timer = QueryTimer::new("create_return");
        let mut tx = self.pool.begin().await?;

        // Peek at the assignment without a lock to learn the device, then
        // lock in the device-first order and re-read.
        let device_id: Option<(Uuid,)> =
            sqlx::query_as("SELECT device_id FROM assignments WHERE id = $1")
                .bind(req.assignment_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (device_id,) = device_id.ok_or(LifecycleRepoError::NotFound("assignment"))?;

        let device = lock_device(&mut tx, device_id)
            .await?
            .ok_or(LifecycleRepoError::NotFound("device"))?;
        let assignment = lock_assignment(&mut tx, req.assignment_id)
            .await?
            .ok_or(LifecycleRepoError::NotFound("assignment"))?;

        let has_existing: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM returns WHERE assignment_id = $1")
                .bind(assignment.id)
                .fetch_one(&mut *tx)
                .await?;

        let plan = plan_return_creation(ReturnContext {
            assignment_id: assignment.id,
            assignment_active: assignment.is_active(),
            has_existing_return: has_existing.0 > 0,
            delivery_date: assignment.delivery_date,
            return_date: req.return_date,
            condition: req.condition,
            device_status: device.status,
        })?;

        let entity = sqlx::query_as::<_, ReturnEntity>(
            r#"
            INSERT INTO returns (assignment_id, return_date, condition, notes, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, assignment_id, return_date, condition, notes, created_by, created_at
            "#,
        )
        .bind(assignment.id)
        .bind(req.return_date)
        .bind(req.condition.to_string())
        .bind(&req.notes)
        .bind(actor.id)
        .fetch_one(&mut *tx)
        .await?;
        let return_record = entity.into_domain()?;

        sqlx::query(
            r#"
            UPDATE assignments
            SET status = 'FINALIZADA', return_date = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(assignment.id)
        .bind(req.return_date)
        .execute(&mut *tx)
        .await?;

        if let Some(transition) = plan.device_transition {
            set_device_status(&mut tx, device.id, transition.to).await?;
            record_audit(
                &mut tx,
                audit::device_status_changed(
                    actor,
                    &device,
                    transition,
                    Some(&format!("Return filed in condition {}", req.condition)),
                ),
            )
            .await;
        }
        if let Some(status) = plan.skipped_terminal_status {
            warn!(
                device_id = %device.id,
                context = %audit::terminal_skip_context(status),
                "return filed against a device in a terminal state"
            );
        }
        record_audit(
            &mut tx,
            audit::entity_created(
                actor,
                audit::entity::RETURN,
                return_record.id,
                &format!("Return for assignment {}", assignment.id),
            ),
        )
        .await;
        record_audit(
            &mut tx,
            audit::assignment_finalized(actor, &assignment, "Return filed"),
        )
        .await;

        tx.commit().await?;
        timer.record();
        Ok(return_record)
    }

    /// Reports a device lost: `ROBO`, snapshot into the active assignment's
    /// discount data, assignment finalized.
    pub async fn mark_device_lost(
        &self,
        device_id: Uuid,
        req: &MarkDeviceLostRequest,
        actor: &Actor,
    ) -> Result<Device, LifecycleRepoError> {
        let timer = QueryTimer::new("mark_device_lost");
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let device = lock_device(&mut tx, device_id)
            .await?
            .ok_or(LifecycleRepoError::NotFound("device"))?;
        let assignment = lock_active_assignment(&mut tx, device_id)
            .await?
            .ok_or(LifecycleError::NoActiveAssignment { device_id })?;

        let plan = plan_device_loss(&device, Some(&assignment), now, &req.context)?;

        let mut discount_data = assignment.discount_data().unwrap_or_default();
        discount_data.device_snapshot = Some(plan.snapshot.clone());

        sqlx::query(
            r#"
            UPDATE assignments
            SET status = 'FINALIZADA', return_date = $2, notes = $3, discount_data = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(plan.finalize.assignment_id)
        .bind(plan.finalize.return_date)
        .bind(&plan.finalize.notes)
        .bind(discount_data.to_json())
        .execute(&mut *tx)
        .await?;

        let updated = set_device_status(&mut tx, device.id, plan.device_transition.to).await?;

        record_audit(
            &mut tx,
            audit::device_status_changed(actor, &device, plan.device_transition, Some(&req.context)),
        )
        .await;
        record_audit(
            &mut tx,
            audit::snapshot_captured(actor, assignment.id, &plan.snapshot),
        )
        .await;
        record_audit(
            &mut tx,
            audit::assignment_finalized(actor, &assignment, "Device reported as ROBO"),
        )
        .await;

        tx.commit().await?;
        timer.record();
        Ok(updated)
    }

    /// Retires a device: `BAJA`, finalizing any active assignment.
    pub async fn mark_device_retired(
        &self,
        device_id: Uuid,
        req: &MarkDeviceRetiredRequest,
        actor: &Actor,
    ) -> Result<Device, LifecycleRepoError> {
        let timer = QueryTimer::new("mark_device_retired");
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let device = lock_device(&mut tx, device_id)
            .await?
            .ok_or(LifecycleRepoError::NotFound("device"))?;
        let assignment = lock_active_assignment(&mut tx, device_id).await?;

        let plan = plan_device_retirement(&device, assignment.as_ref(), now, &req.reason)?;

        if let Some(FinalizeAssignment {
            assignment_id,
            notes,
            return_date,
        }) = &plan.finalize
        {
            sqlx::query(
                r#"
                UPDATE assignments
                SET status = 'FINALIZADA', return_date = $2, notes = $3, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(assignment_id)
            .bind(return_date)
            .bind(notes)
            .execute(&mut *tx)
            .await?;
        }

        let updated = match plan.device_transition {
            Some(transition) => {
                let updated = set_device_status(&mut tx, device.id, transition.to).await?;
                record_audit(
                    &mut tx,
                    audit::device_status_changed(actor, &device, transition, Some(&req.reason)),
                )
                .await;
                updated
            }
            // Already retired: idempotent no-op, no audit entry.
            None => device.clone(),
        };

        if let (Some(_), Some(assignment)) = (&plan.finalize, &assignment) {
            record_audit(
                &mut tx,
                audit::assignment_finalized(actor, assignment, "Device retired (BAJA)"),
            )
            .await;
        }

        tx.commit().await?;
        timer.record();
        Ok(updated)
    }

    /// Explicit status change without cascade side effects. Same-status
    /// requests are idempotent no-ops that leave no audit entry.
    pub async fn change_device_status(
        &self,
        device_id: Uuid,
        target: DeviceStatus,
        actor: &Actor,
    ) -> Result<Device, LifecycleRepoError> {
        let timer = QueryTimer::new("change_device_status");
        let mut tx = self.pool.begin().await?;

        let device = lock_device(&mut tx, device_id)
            .await?
            .ok_or(LifecycleRepoError::NotFound("device"))?;
        let active_count = count_active_assignments(&mut tx, device_id).await?;

        let updated = match plan_status_change(device.status, target, active_count > 0)? {
            Some(transition) => {
                let updated = set_device_status(&mut tx, device.id, transition.to).await?;
                record_audit(
                    &mut tx,
                    audit::device_status_changed(actor, &device, transition, None),
                )
                .await;
                updated
            }
            None => device,
        };

        tx.commit().await?;
        timer.record();
        Ok(updated)
    }

    /// Signs the delivery letter of an active assignment.
    pub async fn sign_letter(
        &self,
        assignment_id: Uuid,
        actor: &Actor,
    ) -> Result<Assignment, LifecycleRepoError> {
        let timer = QueryTimer::new("sign_letter");
        let mut tx = self.pool.begin().await?;

        let assignment = lock_assignment(&mut tx, assignment_id)
            .await?
            .ok_or(LifecycleRepoError::NotFound("assignment"))?;

        plan_letter_signature(assignment.id, assignment.is_active(), assignment.letter_status)?;

        let entity = sqlx::query_as::<_, AssignmentEntity>(&format!(
            r#"
            UPDATE assignments
            SET letter_status = $2, letter_signed_at = NOW(), letter_signed_by = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(assignment.id)
        .bind(LetterStatus::Firmada.to_string())
        .bind(&actor.label)
        .fetch_one(&mut *tx)
        .await?;
        let signed = entity.into_domain()?;

        record_audit(&mut tx, audit::letter_signed(actor, &signed)).await;

        tx.commit().await?;
        timer.record();
        Ok(signed)
    }
}

async fn lock_device(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Device>, sqlx::Error> {
    let entity = sqlx::query_as::<_, DeviceEntity>(&format!(
        "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    entity.map(DeviceEntity::into_domain).transpose()
}

async fn lock_assignment(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Assignment>, sqlx::Error> {
    let entity = sqlx::query_as::<_, AssignmentEntity>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    entity.map(AssignmentEntity::into_domain).transpose()
}

async fn lock_active_assignment(
    tx: &mut Transaction<'_, Postgres>,
    device_id: Uuid,
) -> Result<Option<Assignment>, sqlx::Error> {
    let entity = sqlx::query_as::<_, AssignmentEntity>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments \
         WHERE device_id = $1 AND status = 'ACTIVA' FOR UPDATE"
    ))
    .bind(device_id)
    .fetch_optional(&mut **tx)
    .await?;
    entity.map(AssignmentEntity::into_domain).transpose()
}

async fn count_active_assignments(
    tx: &mut Transaction<'_, Postgres>,
    device_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM assignments WHERE device_id = $1 AND status = 'ACTIVA'")
            .bind(device_id)
            .fetch_one(&mut **tx)
            .await?;
    Ok(count.0)
}

async fn set_device_status(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: DeviceStatus,
) -> Result<Device, sqlx::Error> {
    let entity = sqlx::query_as::<_, DeviceEntity>(&format!(
        "UPDATE devices SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {DEVICE_COLUMNS}"
    ))
    .bind(id)
    .bind(status.to_string())
    .fetch_one(&mut **tx)
    .await?;
    entity.into_domain()
}

async fn lock_request_status(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT status FROM device_requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(row.map(|(status,)| status))
}

async fn complete_request(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE device_requests SET status = 'COMPLETADA', updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Appends an audit entry behind a savepoint. Failures are logged and
/// swallowed: the audit trail never blocks a business change.
async fn record_audit(
    tx: &mut Transaction<'_, Postgres>,
    input: domain::models::CreateAuditLogInput,
) {
    let result = async {
        let mut savepoint = tx.begin().await?;
        AuditLogRepository::insert_with(&mut *savepoint, &input).await?;
        savepoint.commit().await
    }
    .await;

    if let Err(err) = result {
        warn!(
            error = %err,
            entity_type = %input.entity_type,
            entity_id = %input.entity_id,
            "failed to append audit entry"
        );
    }
}
