//! Device repository.
//!
//! Status mutations are not exposed here; they go through the lifecycle
//! repository so every transition runs the status machine and lands in the
//! audit trail.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{CreateDeviceRequest, Device, DeviceStatus, DeviceType, UpdateDeviceRequest};
use shared::pagination::{Page, PageParams};

use crate::entities::DeviceEntity;

use super::DeleteOutcome;

pub(crate) const DEVICE_COLUMNS: &str = "id, device_type, brand, model, serial_number, imei, \
     phone_number, invoice_number, branch_id, intake_date, initial_value, depreciated_value, \
     manual_value, status, created_by, created_at, updated_at";

/// Listing filters for the device catalog.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub status: Option<DeviceStatus>,
    pub device_type: Option<DeviceType>,
    pub branch_id: Option<Uuid>,
    /// Matched case-insensitively against brand, model, serial and IMEI.
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        req: &CreateDeviceRequest,
        initial_depreciated: Option<Decimal>,
        created_by: Uuid,
    ) -> Result<Device, sqlx::Error> {
        let entity = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            INSERT INTO devices (device_type, brand, model, serial_number, imei, phone_number,
                                 invoice_number, branch_id, intake_date, initial_value,
                                 depreciated_value, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(req.device_type.to_string())
        .bind(&req.brand)
        .bind(&req.model)
        .bind(&req.serial_number)
        .bind(&req.imei)
        .bind(&req.phone_number)
        .bind(&req.invoice_number)
        .bind(req.branch_id)
        .bind(req.intake_date)
        .bind(req.initial_value)
        .bind(initial_depreciated)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        entity.into_domain()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Device>, sqlx::Error> {
        let entity = sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        entity.map(DeviceEntity::into_domain).transpose()
    }

    pub async fn list(
        &self,
        filter: &DeviceFilter,
        page: &PageParams,
    ) -> Result<Page<Device>, sqlx::Error> {
        let status = filter.status.map(|s| s.to_string());
        let device_type = filter.device_type.map(|t| t.to_string());
        let search = filter
            .search
            .as_deref()
            .map(|s| format!("%{}%", s.trim()));

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM devices
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR device_type = $2)
              AND ($3::uuid IS NULL OR branch_id = $3)
              AND ($4::text IS NULL OR brand ILIKE $4 OR model ILIKE $4
                   OR serial_number ILIKE $4 OR imei ILIKE $4)
            "#,
        )
        .bind(&status)
        .bind(&device_type)
        .bind(filter.branch_id)
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        let entities = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            SELECT {DEVICE_COLUMNS} FROM devices
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR device_type = $2)
              AND ($3::uuid IS NULL OR branch_id = $3)
              AND ($4::text IS NULL OR brand ILIKE $4 OR model ILIKE $4
                   OR serial_number ILIKE $4 OR imei ILIKE $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(&status)
        .bind(&device_type)
        .bind(filter.branch_id)
        .bind(&search)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = entities
            .into_iter()
            .map(DeviceEntity::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, *page, total.0))
    }

    /// Updates descriptive fields. A supplied `depreciated_value` marks the
    /// device as manually valued; otherwise `recalculated_value` (computed by
    /// the caller from the current inputs) refreshes the stored value.
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateDeviceRequest,
        recalculated_value: Option<Decimal>,
    ) -> Result<Option<Device>, sqlx::Error> {
        let entity = sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            UPDATE devices
            SET brand = COALESCE($2, brand),
                model = COALESCE($3, model),
                phone_number = COALESCE($4, phone_number),
                invoice_number = COALESCE($5, invoice_number),
                branch_id = COALESCE($6, branch_id),
                initial_value = COALESCE($7, initial_value),
                depreciated_value = COALESCE($8, $9, depreciated_value),
                manual_value = CASE WHEN $8::numeric IS NOT NULL THEN TRUE ELSE manual_value END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.brand)
        .bind(&req.model)
        .bind(&req.phone_number)
        .bind(&req.invoice_number)
        .bind(req.branch_id)
        .bind(req.initial_value)
        .bind(req.depreciated_value)
        .bind(recalculated_value)
        .fetch_optional(&self.pool)
        .await?;
        entity.map(DeviceEntity::into_domain).transpose()
    }

    /// Deletes a device unless assignments reference it (historical records
    /// must survive; retire the device instead).
    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutcome, sqlx::Error> {
        let dependents: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM assignments WHERE device_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if dependents.0 > 0 {
            return Ok(DeleteOutcome::Blocked {
                dependents: dependents.0,
                dependent_kind: "assignments",
            });
        }

        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(if result.rows_affected() > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    /// Device counts grouped by status, for the stats endpoint.
    pub async fn counts_by_status(&self) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as("SELECT status, COUNT(*) FROM devices GROUP BY status ORDER BY status")
            .fetch_all(&self.pool)
            .await
    }

    /// Device counts grouped by type, for the stats endpoint.
    pub async fn counts_by_type(&self) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT device_type, COUNT(*) FROM devices GROUP BY device_type ORDER BY device_type",
        )
        .fetch_all(&self.pool)
        .await
    }
}
