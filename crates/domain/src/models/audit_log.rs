//! Audit log domain models.
//!
//! The audit trail is an append-only log of every attributable state change.
//! Entries are never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identity supplied by the caller for audit attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: Uuid,
    pub label: String,
}

impl Actor {
    pub fn new(id: Uuid, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// Audited operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Create => write!(f, "CREATE"),
            AuditAction::Update => write!(f, "UPDATE"),
            AuditAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single field change with old and new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<JsonValue>,
    pub new_value: Option<JsonValue>,
}

impl FieldChange {
    pub fn new(
        field: impl Into<String>,
        old_value: Option<JsonValue>,
        new_value: Option<JsonValue>,
    ) -> Self {
        Self {
            field: field.into(),
            old_value,
            new_value,
        }
    }
}

/// Structured change payload attached to an audit entry.
///
/// The shape is a compile-time contract built by each entity's change
/// descriptors, not a runtime probe of arbitrary fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    /// Human-readable label of the affected entity.
    pub entity_label: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldChange>,

    /// Free-form context line, e.g. the retirement reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ChangeSet {
    pub fn new(entity_label: impl Into<String>) -> Self {
        Self {
            entity_label: entity_label.into(),
            fields: Vec::new(),
            context: None,
        }
    }

    pub fn with_field(
        mut self,
        field: impl Into<String>,
        old_value: Option<JsonValue>,
        new_value: Option<JsonValue>,
    ) -> Self {
        self.fields.push(FieldChange::new(field, old_value, new_value));
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// A persisted audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_label: String,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub changes: Option<JsonValue>,
    pub timestamp: DateTime<Utc>,
}

/// Input for appending an audit trail entry.
#[derive(Debug, Clone)]
pub struct CreateAuditLogInput {
    pub actor: Actor,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub changes: Option<JsonValue>,
}

impl CreateAuditLogInput {
    pub fn new(
        actor: Actor,
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: Uuid,
    ) -> Self {
        Self {
            actor,
            action,
            entity_type: entity_type.into(),
            entity_id,
            changes: None,
        }
    }

    pub fn with_changes(mut self, changes: ChangeSet) -> Self {
        self.changes = Some(changes.to_json());
        self
    }
}

/// Query parameters for listing audit logs.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListAuditLogsQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audit_action_roundtrip() {
        for s in ["CREATE", "UPDATE", "DELETE"] {
            assert_eq!(s.parse::<AuditAction>().unwrap().to_string(), s);
        }
        assert!("UPSERT".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_change_set_builder() {
        let changes = ChangeSet::new("Laptop - Lenovo ThinkPad (PF-1)")
            .with_field("estado", Some(json!("DISPONIBLE")), Some(json!("ASIGNADO")))
            .with_context("Assigned on intake");

        assert_eq!(changes.fields.len(), 1);
        assert_eq!(changes.fields[0].field, "estado");

        let value = changes.to_json();
        assert_eq!(value["entityLabel"], json!("Laptop - Lenovo ThinkPad (PF-1)"));
        assert_eq!(value["fields"][0]["oldValue"], json!("DISPONIBLE"));
        assert_eq!(value["context"], json!("Assigned on intake"));
    }

    #[test]
    fn test_create_input_carries_changes() {
        let actor = Actor::new(Uuid::new_v4(), "ops@example.com");
        let input = CreateAuditLogInput::new(
            actor.clone(),
            AuditAction::Update,
            "Device",
            Uuid::new_v4(),
        )
        .with_changes(ChangeSet::new("some device"));

        assert_eq!(input.actor, actor);
        assert!(input.changes.is_some());
    }
}
