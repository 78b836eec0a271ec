//! Branch repository.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{Branch, CreateBranchRequest, UpdateBranchRequest};
use shared::pagination::{Page, PageParams};

use crate::entities::BranchEntity;

use super::DeleteOutcome;

const BRANCH_COLUMNS: &str = "id, name, code, address, created_at, updated_at";

#[derive(Clone)]
pub struct BranchRepository {
    pool: PgPool,
}

impl BranchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, req: &CreateBranchRequest) -> Result<Branch, sqlx::Error> {
        let entity = sqlx::query_as::<_, BranchEntity>(&format!(
            r#"
            INSERT INTO branches (name, code, address)
            VALUES ($1, $2, $3)
            RETURNING {BRANCH_COLUMNS}
            "#
        ))
        .bind(&req.name)
        .bind(&req.code)
        .bind(&req.address)
        .fetch_one(&self.pool)
        .await?;
        Ok(entity.into())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Branch>, sqlx::Error> {
        let entity = sqlx::query_as::<_, BranchEntity>(&format!(
            "SELECT {BRANCH_COLUMNS} FROM branches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entity.map(Into::into))
    }

    pub async fn list(&self, page: &PageParams) -> Result<Page<Branch>, sqlx::Error> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM branches")
            .fetch_one(&self.pool)
            .await?;

        let entities = sqlx::query_as::<_, BranchEntity>(&format!(
            "SELECT {BRANCH_COLUMNS} FROM branches ORDER BY name ASC LIMIT $1 OFFSET $2"
        ))
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
        req: &UpdateBranchRequest,
    ) -> Result<Option<Branch>, sqlx::Error> {
        let entity = sqlx::query_as::<_, BranchEntity>(&format!(
            r#"
            UPDATE branches
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BRANCH_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.name)
        .bind(&req.address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entity.map(Into::into))
    }

    /// Deletes a branch unless devices or employees still reference it.
    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutcome, sqlx::Error> {
        let dependents: (i64,) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM devices WHERE branch_id = $1)
                 + (SELECT COUNT(*) FROM employees WHERE branch_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if dependents.0 > 0 {
            return Ok(DeleteOutcome::Blocked {
                dependents: dependents.0,
                dependent_kind: "devices or employees",
            });
        }

        let result = sqlx::query("DELETE FROM branches WHERE id = $1")
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
