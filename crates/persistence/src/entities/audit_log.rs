//! Audit log entity.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::AuditLogEntry;

use super::decode_err;

/// Database entity for audit trail entries. Append-only.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntity {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_label: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub changes: Option<JsonValue>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntity {
    pub fn into_domain(self) -> Result<AuditLogEntry, sqlx::Error> {
        Ok(AuditLogEntry {
            id: self.id,
            actor_id: self.actor_id,
            actor_label: self.actor_label,
            action: self.action.parse().map_err(decode_err)?,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            changes: self.changes,
            timestamp: self.timestamp,
        })
    }
}
