//! Assignment domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::device::DeviceSnapshot;

/// Whether a device is handed over permanently or for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    Permanente,
    Temporal,
}

impl FromStr for DeliveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERMANENTE" => Ok(DeliveryType::Permanente),
            "TEMPORAL" => Ok(DeliveryType::Temporal),
            _ => Err(format!("Unknown delivery type: {}", s)),
        }
    }
}

impl std::fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryType::Permanente => write!(f, "PERMANENTE"),
            DeliveryType::Temporal => write!(f, "TEMPORAL"),
        }
    }
}

/// Signature sub-state of the delivery letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LetterStatus {
    Pendiente,
    Firmada,
    NoAplica,
}

impl FromStr for LetterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDIENTE" => Ok(LetterStatus::Pendiente),
            "FIRMADA" => Ok(LetterStatus::Firmada),
            "NO_APLICA" => Ok(LetterStatus::NoAplica),
            _ => Err(format!("Unknown letter status: {}", s)),
        }
    }
}

impl std::fmt::Display for LetterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LetterStatus::Pendiente => write!(f, "PENDIENTE"),
            LetterStatus::Firmada => write!(f, "FIRMADA"),
            LetterStatus::NoAplica => write!(f, "NO_APLICA"),
        }
    }
}

/// Lifecycle of an assignment. Never reopened once finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Activa,
    Finalizada,
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVA" => Ok(AssignmentStatus::Activa),
            "FINALIZADA" => Ok(AssignmentStatus::Finalizada),
            _ => Err(format!("Unknown assignment status: {}", s)),
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentStatus::Activa => write!(f, "ACTIVA"),
            AssignmentStatus::Finalizada => write!(f, "FINALIZADA"),
        }
    }
}

/// Structured discount/responsibility payload carried by an assignment.
///
/// `device_snapshot` is populated at the moment of a terminal loss
/// transition, never reconstructed after the fact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_snapshot: Option<DeviceSnapshot>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

impl DiscountData {
    /// Parses discount data from its stored JSON form. Unknown keys are
    /// preserved in `extra`.
    pub fn from_json(value: &JsonValue) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// The record of a device being handed to an employee for a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub request_id: Option<Uuid>,
    pub employee_id: Uuid,
    pub device_id: Uuid,
    pub delivery_type: DeliveryType,
    pub delivery_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub letter_status: LetterStatus,
    pub letter_signed_at: Option<DateTime<Utc>>,
    pub letter_signed_by: Option<String>,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
    pub discount_data: Option<JsonValue>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Activa
    }

    /// Parsed discount data, if any.
    pub fn discount_data(&self) -> Option<DiscountData> {
        self.discount_data.as_ref().map(DiscountData::from_json)
    }

    /// The embedded device snapshot, when one was captured.
    pub fn device_snapshot(&self) -> Option<DeviceSnapshot> {
        self.discount_data().and_then(|d| d.device_snapshot)
    }

    /// Appends an automatic timestamped line to the notes field.
    pub fn appended_note(&self, now: DateTime<Utc>, line: &str) -> String {
        let stamped = format!("[{}] {}", now.format("%Y-%m-%d %H:%M UTC"), line);
        match self.notes.as_deref().map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, stamped),
            _ => stamped,
        }
    }
}

/// Request payload for creating an assignment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub request_id: Option<Uuid>,
    pub employee_id: Uuid,
    pub device_id: Uuid,
    pub delivery_type: DeliveryType,
    pub delivery_date: NaiveDate,

    #[serde(default = "default_letter_status")]
    pub letter_status: LetterStatus,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

fn default_letter_status() -> LetterStatus {
    LetterStatus::Pendiente
}

/// Request payload for updating an assignment.
///
/// Once `FINALIZADA`, only `notes` is accepted; while `ACTIVA` the employee
/// and device references are frozen (close and create a new assignment
/// instead).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    pub delivery_type: Option<DeliveryType>,
    pub letter_status: Option<LetterStatus>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl UpdateAssignmentRequest {
    /// Whether the payload touches anything beyond the notes field.
    pub fn touches_locked_fields(&self) -> bool {
        self.delivery_type.is_some() || self.letter_status.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::DeviceType;
    use chrono::TimeZone;

    fn assignment() -> Assignment {
        Assignment {
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
        }
    }

    #[test]
    fn test_appended_note_on_empty_notes() {
        let a = assignment();
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 14, 30, 0).unwrap();
        assert_eq!(
            a.appended_note(now, "Device reported lost"),
            "[2024-05-10 14:30 UTC] Device reported lost"
        );
    }

    #[test]
    fn test_appended_note_preserves_existing_text() {
        let mut a = assignment();
        a.notes = Some("Delivered with charger".to_string());
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 14, 30, 0).unwrap();
        let combined = a.appended_note(now, "Retired: warranty expired");
        assert!(combined.starts_with("Delivered with charger\n["));
        assert!(combined.ends_with("Retired: warranty expired"));
    }

    #[test]
    fn test_discount_data_roundtrip_preserves_extra_keys() {
        let snapshot = DeviceSnapshot {
            device_id: Uuid::new_v4(),
            device_type: DeviceType::Telefono,
            brand: "Samsung".to_string(),
            model: Some("A54".to_string()),
            serial_number: None,
            imei: Some("490154203237518".to_string()),
        };
        let mut data = DiscountData {
            device_snapshot: Some(snapshot.clone()),
            extra: serde_json::Map::new(),
        };
        data.extra
            .insert("installments".to_string(), serde_json::json!(6));

        let json = data.to_json();
        let parsed = DiscountData::from_json(&json);
        assert_eq!(parsed.device_snapshot, Some(snapshot));
        assert_eq!(parsed.extra.get("installments"), Some(&serde_json::json!(6)));
    }

    #[test]
    fn test_update_payload_locked_field_detection() {
        let notes_only = UpdateAssignmentRequest {
            delivery_type: None,
            letter_status: None,
            notes: Some("Charger returned separately".to_string()),
        };
        assert!(!notes_only.touches_locked_fields());

        let with_letter = UpdateAssignmentRequest {
            delivery_type: None,
            letter_status: Some(LetterStatus::NoAplica),
            notes: None,
        };
        assert!(with_letter.touches_locked_fields());
    }
}
