//! Assignment repository.
//!
//! Creation, letter signature and finalization all run through the lifecycle
//! repository; this one covers reads and the narrow field updates.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{Assignment, AssignmentStatus, UpdateAssignmentRequest};
use shared::pagination::{Page, PageParams};

use crate::entities::AssignmentEntity;

pub(crate) const ASSIGNMENT_COLUMNS: &str = "id, request_id, employee_id, device_id, \
     delivery_type, delivery_date, return_date, letter_status, letter_signed_at, \
     letter_signed_by, status, notes, discount_data, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Assignment>, sqlx::Error> {
        let entity = sqlx::query_as::<_, AssignmentEntity>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        entity.map(AssignmentEntity::into_domain).transpose()
    }

    pub async fn list(
        &self,
        employee_id: Option<Uuid>,
        device_id: Option<Uuid>,
        status: Option<AssignmentStatus>,
        page: &PageParams,
    ) -> Result<Page<Assignment>, sqlx::Error> {
        let status = status.map(|s| s.to_string());

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM assignments
            WHERE ($1::uuid IS NULL OR employee_id = $1)
              AND ($2::uuid IS NULL OR device_id = $2)
              AND ($3::text IS NULL OR status = $3)
            "#,
        )
        .bind(employee_id)
        .bind(device_id)
        .bind(&status)
        .fetch_one(&self.pool)
        .await?;

        let entities = sqlx::query_as::<_, AssignmentEntity>(&format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS} FROM assignments
            WHERE ($1::uuid IS NULL OR employee_id = $1)
              AND ($2::uuid IS NULL OR device_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY delivery_date DESC, created_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(employee_id)
        .bind(device_id)
        .bind(&status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = entities
            .into_iter()
            .map(AssignmentEntity::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, *page, total.0))
    }

    /// The device's current `ACTIVA` assignment, if any.
    pub async fn find_active_for_device(
        &self,
        device_id: Uuid,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let entity = sqlx::query_as::<_, AssignmentEntity>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE device_id = $1 AND status = 'ACTIVA'"
        ))
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        entity.map(AssignmentEntity::into_domain).transpose()
    }

    /// Updates the mutable fields. Lock enforcement (only notes once
    /// `FINALIZADA`) happens in the handler before this is called.
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let delivery_type = req.delivery_type.map(|t| t.to_string());
        let letter_status = req.letter_status.map(|s| s.to_string());

        let entity = sqlx::query_as::<_, AssignmentEntity>(&format!(
            r#"
            UPDATE assignments
            SET delivery_type = COALESCE($2, delivery_type),
                letter_status = COALESCE($3, letter_status),
                notes = COALESCE($4, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&delivery_type)
        .bind(&letter_status)
        .bind(&req.notes)
        .fetch_optional(&self.pool)
        .await?;
        entity.map(AssignmentEntity::into_domain).transpose()
    }
}
