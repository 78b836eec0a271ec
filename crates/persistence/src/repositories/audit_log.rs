//! Audit log repository. Append-only: no update or delete methods exist.

use sqlx::{PgConnection, PgPool};

use domain::models::{AuditLogEntry, CreateAuditLogInput, ListAuditLogsQuery};
use shared::pagination::{Page, PageParams};

use crate::entities::AuditLogEntity;

const AUDIT_COLUMNS: &str =
    "id, actor_id, actor_label, action, entity_type, entity_id, changes, timestamp";

#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, input: &CreateAuditLogInput) -> Result<AuditLogEntry, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_with(&mut *conn, input).await
    }

    /// Inserts on an existing connection, so cascade transactions can append
    /// entries inside their own transaction.
    pub async fn insert_with(
        conn: &mut PgConnection,
        input: &CreateAuditLogInput,
    ) -> Result<AuditLogEntry, sqlx::Error> {
        let entity = sqlx::query_as::<_, AuditLogEntity>(&format!(
            r#"
            INSERT INTO audit_logs (actor_id, actor_label, action, entity_type, entity_id, changes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {AUDIT_COLUMNS}
            "#
        ))
        .bind(input.actor.id)
        .bind(&input.actor.label)
        .bind(input.action.to_string())
        .bind(&input.entity_type)
        .bind(input.entity_id)
        .bind(&input.changes)
        .fetch_one(conn)
        .await?;
        entity.into_domain()
    }

    pub async fn list(
        &self,
        query: &ListAuditLogsQuery,
        page: &PageParams,
    ) -> Result<Page<AuditLogEntry>, sqlx::Error> {
        let action = query.action.map(|a| a.to_string());

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM audit_logs
            WHERE ($1::text IS NULL OR entity_type = $1)
              AND ($2::uuid IS NULL OR entity_id = $2)
              AND ($3::uuid IS NULL OR actor_id = $3)
              AND ($4::text IS NULL OR action = $4)
              AND ($5::timestamptz IS NULL OR timestamp >= $5)
              AND ($6::timestamptz IS NULL OR timestamp <= $6)
            "#,
        )
        .bind(&query.entity_type)
        .bind(query.entity_id)
        .bind(query.actor_id)
        .bind(&action)
        .bind(query.from)
        .bind(query.to)
        .fetch_one(&self.pool)
        .await?;

        let entities = sqlx::query_as::<_, AuditLogEntity>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS} FROM audit_logs
            WHERE ($1::text IS NULL OR entity_type = $1)
              AND ($2::uuid IS NULL OR entity_id = $2)
              AND ($3::uuid IS NULL OR actor_id = $3)
              AND ($4::text IS NULL OR action = $4)
              AND ($5::timestamptz IS NULL OR timestamp >= $5)
              AND ($6::timestamptz IS NULL OR timestamp <= $6)
            ORDER BY timestamp DESC
            LIMIT $7 OFFSET $8
            "#
        ))
        .bind(&query.entity_type)
        .bind(query.entity_id)
        .bind(query.actor_id)
        .bind(&action)
        .bind(query.from)
        .bind(query.to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = entities
            .into_iter()
            .map(AuditLogEntity::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, *page, total.0))
    }
}
