//! Device request repository.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{
    CreateDeviceRequestPayload, DeviceRequest, RequestStatus, UpdateDeviceRequestPayload,
};
use shared::pagination::{Page, PageParams};

use crate::entities::DeviceRequestEntity;

use super::DeleteOutcome;

const REQUEST_COLUMNS: &str = "id, employee_id, branch_id, reason, requesting_manager, \
     device_type, justification, requested_at, status, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct DeviceRequestRepository {
    pool: PgPool,
}

impl DeviceRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        req: &CreateDeviceRequestPayload,
        created_by: Uuid,
    ) -> Result<DeviceRequest, sqlx::Error> {
        let entity = sqlx::query_as::<_, DeviceRequestEntity>(&format!(
            r#"
            INSERT INTO device_requests (employee_id, branch_id, reason, requesting_manager,
                                         device_type, justification, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(req.employee_id)
        .bind(req.branch_id)
        .bind(req.reason.to_string())
        .bind(&req.requesting_manager)
        .bind(req.device_type.to_string())
        .bind(&req.justification)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        entity.into_domain()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DeviceRequest>, sqlx::Error> {
        let entity = sqlx::query_as::<_, DeviceRequestEntity>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM device_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        entity.map(DeviceRequestEntity::into_domain).transpose()
    }

    pub async fn list(
        &self,
        status: Option<RequestStatus>,
        employee_id: Option<Uuid>,
        page: &PageParams,
    ) -> Result<Page<DeviceRequest>, sqlx::Error> {
        let status = status.map(|s| s.to_string());

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM device_requests
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR employee_id = $2)
            "#,
        )
        .bind(&status)
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await?;

        let entities = sqlx::query_as::<_, DeviceRequestEntity>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM device_requests
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR employee_id = $2)
            ORDER BY requested_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(&status)
        .bind(employee_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = entities
            .into_iter()
            .map(DeviceRequestEntity::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, *page, total.0))
    }

    /// Updates a request. Lock enforcement (only justification once
    /// `COMPLETADA`) happens in the handler before this is called.
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateDeviceRequestPayload,
    ) -> Result<Option<DeviceRequest>, sqlx::Error> {
        let status = req.status.map(|s| s.to_string());
        let entity = sqlx::query_as::<_, DeviceRequestEntity>(&format!(
            r#"
            UPDATE device_requests
            SET status = COALESCE($2, status),
                requesting_manager = COALESCE($3, requesting_manager),
                justification = COALESCE($4, justification),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&status)
        .bind(&req.requesting_manager)
        .bind(&req.justification)
        .fetch_optional(&self.pool)
        .await?;
        entity.map(DeviceRequestEntity::into_domain).transpose()
    }

    /// Deletes a request unless an assignment references it.
    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutcome, sqlx::Error> {
        let dependents: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM assignments WHERE request_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if dependents.0 > 0 {
            return Ok(DeleteOutcome::Blocked {
                dependents: dependents.0,
                dependent_kind: "assignments",
            });
        }

        let result = sqlx::query("DELETE FROM device_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(if result.rows_affected() > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }
}
