//! Audit trail descriptors.
//!
//! Every audited operation has an explicit descriptor here that spells out
//! which fields go into the entry. Nothing probes entities at runtime for
//! "whatever changed": the recorded shape is a compile-time contract.

use serde_json::json;
use uuid::Uuid;

use crate::models::{
    Actor, Assignment, AuditAction, ChangeSet, CreateAuditLogInput, Device, DeviceSnapshot,
    DeviceStatus, LetterStatus, RequestStatus,
};
use crate::services::status_machine::StatusTransition;

/// Entity type names as stored in `audit_logs.entity_type`.
pub mod entity {
    pub const BRANCH: &str = "Branch";
    pub const EMPLOYEE: &str = "Employee";
    pub const DEVICE: &str = "Device";
    pub const DEVICE_REQUEST: &str = "DeviceRequest";
    pub const ASSIGNMENT: &str = "Assignment";
    pub const RETURN: &str = "Return";
}

/// CREATE entry for any entity, labeled for display.
pub fn entity_created(
    actor: &Actor,
    entity_type: &str,
    entity_id: Uuid,
    entity_label: &str,
) -> CreateAuditLogInput {
    CreateAuditLogInput::new(actor.clone(), AuditAction::Create, entity_type, entity_id)
        .with_changes(ChangeSet::new(entity_label))
}

/// DELETE entry for any entity.
pub fn entity_deleted(
    actor: &Actor,
    entity_type: &str,
    entity_id: Uuid,
    entity_label: &str,
) -> CreateAuditLogInput {
    CreateAuditLogInput::new(actor.clone(), AuditAction::Delete, entity_type, entity_id)
        .with_changes(ChangeSet::new(entity_label))
}

/// UPDATE entry with an explicit set of field changes.
pub fn entity_updated(
    actor: &Actor,
    entity_type: &str,
    entity_id: Uuid,
    changes: ChangeSet,
) -> CreateAuditLogInput {
    CreateAuditLogInput::new(actor.clone(), AuditAction::Update, entity_type, entity_id)
        .with_changes(changes)
}

/// UPDATE entry for a device status transition. Records the `estado` field
/// with old and new values plus the device label, matching the shape read by
/// the audit listing.
pub fn device_status_changed(
    actor: &Actor,
    device: &Device,
    transition: StatusTransition,
    context: Option<&str>,
) -> CreateAuditLogInput {
    let mut changes = ChangeSet::new(device.label()).with_field(
        "estado",
        Some(json!(transition.from.to_string())),
        Some(json!(transition.to.to_string())),
    );
    if let Some(context) = context {
        changes = changes.with_context(context);
    }
    entity_updated(actor, entity::DEVICE, device.id, changes)
}

/// UPDATE entry for an assignment finalized by a cascade (return filed, or
/// device lost/retired).
pub fn assignment_finalized(
    actor: &Actor,
    assignment: &Assignment,
    context: &str,
) -> CreateAuditLogInput {
    let changes = ChangeSet::new(format!("Assignment {}", assignment.id))
        .with_field("status", Some(json!("ACTIVA")), Some(json!("FINALIZADA")))
        .with_context(context);
    entity_updated(actor, entity::ASSIGNMENT, assignment.id, changes)
}

/// UPDATE entry for a request auto-completed by an assignment creation.
pub fn request_completed(
    actor: &Actor,
    request_id: Uuid,
    previous: RequestStatus,
) -> CreateAuditLogInput {
    let changes = ChangeSet::new(format!("DeviceRequest {request_id}"))
        .with_field(
            "status",
            Some(json!(previous.to_string())),
            Some(json!(RequestStatus::Completada.to_string())),
        )
        .with_context("Completed automatically by assignment creation");
    entity_updated(actor, entity::DEVICE_REQUEST, request_id, changes)
}

/// UPDATE entry for a signed delivery letter.
pub fn letter_signed(actor: &Actor, assignment: &Assignment) -> CreateAuditLogInput {
    let changes = ChangeSet::new(format!("Assignment {}", assignment.id)).with_field(
        "letter_status",
        Some(json!(LetterStatus::Pendiente.to_string())),
        Some(json!(LetterStatus::Firmada.to_string())),
    );
    entity_updated(actor, entity::ASSIGNMENT, assignment.id, changes)
}

/// UPDATE entry recording the device snapshot embedded into an assignment's
/// discount data at the moment of a loss.
pub fn snapshot_captured(
    actor: &Actor,
    assignment_id: Uuid,
    snapshot: &DeviceSnapshot,
) -> CreateAuditLogInput {
    let changes = ChangeSet::new(format!("Assignment {assignment_id}")).with_field(
        "discount_data.device_snapshot",
        None,
        serde_json::to_value(snapshot).ok(),
    );
    entity_updated(actor, entity::ASSIGNMENT, assignment_id, changes)
}

/// Context line recorded alongside a skipped device step when the device sat
/// in a terminal state during a cascade.
pub fn terminal_skip_context(status: DeviceStatus) -> String {
    format!("Device step skipped: device already in terminal state {status}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentStatus, DeliveryType, DeviceType};
    use chrono::{NaiveDate, Utc};

    fn actor() -> Actor {
        Actor::new(Uuid::new_v4(), "ops@example.com")
    }

    fn device() -> Device {
        Device {
            id: Uuid::new_v4(),
            device_type: DeviceType::Laptop,
            brand: "Dell".to_string(),
            model: Some("Latitude 5440".to_string()),
            serial_number: Some("DL-7781".to_string()),
            imei: None,
            phone_number: None,
            invoice_number: None,
            branch_id: Uuid::new_v4(),
            intake_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            initial_value: None,
            depreciated_value: None,
            manual_value: false,
            status: DeviceStatus::Disponible,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_change_records_estado_field() {
        let device = device();
        let input = device_status_changed(
            &actor(),
            &device,
            StatusTransition {
                from: DeviceStatus::Disponible,
                to: DeviceStatus::Asignado,
            },
            None,
        );

        assert_eq!(input.action, AuditAction::Update);
        assert_eq!(input.entity_type, entity::DEVICE);
        assert_eq!(input.entity_id, device.id);

        let changes = input.changes.unwrap();
        assert_eq!(changes["fields"][0]["field"], json!("estado"));
        assert_eq!(changes["fields"][0]["oldValue"], json!("DISPONIBLE"));
        assert_eq!(changes["fields"][0]["newValue"], json!("ASIGNADO"));
        assert_eq!(changes["entityLabel"], json!(device.label()));
    }

    #[test]
    fn test_status_change_carries_context() {
        let input = device_status_changed(
            &actor(),
            &device(),
            StatusTransition {
                from: DeviceStatus::Asignado,
                to: DeviceStatus::Robo,
            },
            Some("stolen from vehicle"),
        );
        let changes = input.changes.unwrap();
        assert_eq!(changes["context"], json!("stolen from vehicle"));
    }

    #[test]
    fn test_request_completed_descriptor() {
        let request_id = Uuid::new_v4();
        let input = request_completed(&actor(), request_id, RequestStatus::Pendiente);

        assert_eq!(input.entity_type, entity::DEVICE_REQUEST);
        let changes = input.changes.unwrap();
        assert_eq!(changes["fields"][0]["oldValue"], json!("PENDIENTE"));
        assert_eq!(changes["fields"][0]["newValue"], json!("COMPLETADA"));
    }

    #[test]
    fn test_snapshot_captured_embeds_snapshot() {
        let device = device();
        let input = snapshot_captured(&actor(), Uuid::new_v4(), &device.snapshot());

        let changes = input.changes.unwrap();
        let new_value = &changes["fields"][0]["newValue"];
        assert_eq!(new_value["brand"], json!("Dell"));
        assert_eq!(new_value["serialNumber"], json!("DL-7781"));
    }

    #[test]
    fn test_created_and_deleted_entries() {
        let id = Uuid::new_v4();
        let created = entity_created(&actor(), entity::BRANCH, id, "Sucursal Centro");
        assert_eq!(created.action, AuditAction::Create);
        assert_eq!(
            created.changes.unwrap()["entityLabel"],
            json!("Sucursal Centro")
        );

        let deleted = entity_deleted(&actor(), entity::BRANCH, id, "Sucursal Centro");
        assert_eq!(deleted.action, AuditAction::Delete);
    }

    #[test]
    fn test_terminal_skip_context_names_status() {
        assert_eq!(
            terminal_skip_context(DeviceStatus::Baja),
            "Device step skipped: device already in terminal state BAJA"
        );
        assert!(terminal_skip_context(DeviceStatus::Robo).contains("ROBO"));
    }

    #[test]
    fn test_letter_signed_descriptor() {
        let assignment = Assignment {
            id: Uuid::new_v4(),
            request_id: None,
            employee_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            delivery_type: DeliveryType::Permanente,
            delivery_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            return_date: None,
            letter_status: LetterStatus::Pendiente,
            letter_signed_at: None,
            letter_signed_by: None,
            status: AssignmentStatus::Activa,
            notes: None,
            discount_data: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let input = letter_signed(&actor(), &assignment);
        let changes = input.changes.unwrap();
        assert_eq!(changes["fields"][0]["newValue"], json!("FIRMADA"));
    }
}
