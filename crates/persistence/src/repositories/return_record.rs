//! Return repository.
//!
//! Returns are created exclusively through the lifecycle repository; this one
//! only reads them. No update or delete: returns are immutable.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::ReturnRecord;
use shared::pagination::{Page, PageParams};

use crate::entities::ReturnEntity;

const RETURN_COLUMNS: &str =
    "id, assignment_id, return_date, condition, notes, created_by, created_at";

#[derive(Clone)]
pub struct ReturnRepository {
    pool: PgPool,
}

impl ReturnRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReturnRecord>, sqlx::Error> {
        let entity = sqlx::query_as::<_, ReturnEntity>(&format!(
            "SELECT {RETURN_COLUMNS} FROM returns WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        entity.map(ReturnEntity::into_domain).transpose()
    }

    pub async fn find_by_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<ReturnRecord>, sqlx::Error> {
        let entity = sqlx::query_as::<_, ReturnEntity>(&format!(
            "SELECT {RETURN_COLUMNS} FROM returns WHERE assignment_id = $1"
        ))
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await?;
        entity.map(ReturnEntity::into_domain).transpose()
    }

    pub async fn list(&self, page: &PageParams) -> Result<Page<ReturnRecord>, sqlx::Error> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM returns")
            .fetch_one(&self.pool)
            .await?;

        let entities = sqlx::query_as::<_, ReturnEntity>(&format!(
            "SELECT {RETURN_COLUMNS} FROM returns ORDER BY return_date DESC, created_at DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = entities
            .into_iter()
            .map(ReturnEntity::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, *page, total.0))
    }
}
