//! Employee repository.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{CreateEmployeeRequest, Employee, UpdateEmployeeRequest};
use shared::pagination::{Page, PageParams};

use crate::entities::EmployeeEntity;

use super::DeleteOutcome;

const EMPLOYEE_COLUMNS: &str =
    "id, full_name, national_id, email, position, branch_id, active, created_at, updated_at";

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, req: &CreateEmployeeRequest) -> Result<Employee, sqlx::Error> {
        let entity = sqlx::query_as::<_, EmployeeEntity>(&format!(
            r#"
            INSERT INTO employees (full_name, national_id, email, position, branch_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(&req.full_name)
        .bind(&req.national_id)
        .bind(&req.email)
        .bind(&req.position)
        .bind(req.branch_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(entity.into())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, sqlx::Error> {
        let entity = sqlx::query_as::<_, EmployeeEntity>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entity.map(Into::into))
    }

    pub async fn list(
        &self,
        branch_id: Option<Uuid>,
        active: Option<bool>,
        page: &PageParams,
    ) -> Result<Page<Employee>, sqlx::Error> {
        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM employees
            WHERE ($1::uuid IS NULL OR branch_id = $1)
              AND ($2::boolean IS NULL OR active = $2)
            "#,
        )
        .bind(branch_id)
        .bind(active)
        .fetch_one(&self.pool)
        .await?;

        let entities = sqlx::query_as::<_, EmployeeEntity>(&format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS} FROM employees
            WHERE ($1::uuid IS NULL OR branch_id = $1)
              AND ($2::boolean IS NULL OR active = $2)
            ORDER BY full_name ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(branch_id)
        .bind(active)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = entities.into_iter().map(Into::into).collect();
        Ok(Page::new(items, *page, total.0))
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateEmployeeRequest,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let entity = sqlx::query_as::<_, EmployeeEntity>(&format!(
            r#"
            UPDATE employees
            SET full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                position = COALESCE($4, position),
                branch_id = COALESCE($5, branch_id),
                active = COALESCE($6, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.full_name)
        .bind(&req.email)
        .bind(&req.position)
        .bind(req.branch_id)
        .bind(req.active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entity.map(Into::into))
    }

    /// Deletes an employee unless assignments or requests reference them.
    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutcome, sqlx::Error> {
        let dependents: (i64,) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM assignments WHERE employee_id = $1)
                 + (SELECT COUNT(*) FROM device_requests WHERE employee_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if dependents.0 > 0 {
            return Ok(DeleteOutcome::Blocked {
                dependents: dependents.0,
                dependent_kind: "assignments or requests",
            });
        }

        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
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
