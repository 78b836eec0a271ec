//! Return record domain model.
//!
//! A return is the immutable closing record of an assignment. It is created
//! once and never updated or deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::device::DeviceStatus;

/// Observed condition of a device at return time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceCondition {
    Optimo,
    ConDanos,
    NoFuncional,
}

impl DeviceCondition {
    /// Device status the condition maps to when the return is processed.
    pub fn target_device_status(&self) -> DeviceStatus {
        match self {
            DeviceCondition::Optimo => DeviceStatus::Disponible,
            DeviceCondition::ConDanos | DeviceCondition::NoFuncional => {
                DeviceStatus::Mantenimiento
            }
        }
    }
}

impl FromStr for DeviceCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPTIMO" => Ok(DeviceCondition::Optimo),
            "CON_DANOS" => Ok(DeviceCondition::ConDanos),
            "NO_FUNCIONAL" => Ok(DeviceCondition::NoFuncional),
            _ => Err(format!("Unknown device condition: {}", s)),
        }
    }
}

impl std::fmt::Display for DeviceCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceCondition::Optimo => write!(f, "OPTIMO"),
            DeviceCondition::ConDanos => write!(f, "CON_DANOS"),
            DeviceCondition::NoFuncional => write!(f, "NO_FUNCIONAL"),
        }
    }
}

/// The immutable closing record of an assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRecord {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub return_date: NaiveDate,
    pub condition: DeviceCondition,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request payload for filing a return.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReturnRequest {
    pub assignment_id: Uuid,
    pub return_date: NaiveDate,
    pub condition: DeviceCondition,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_maps_to_device_status() {
        assert_eq!(
            DeviceCondition::Optimo.target_device_status(),
            DeviceStatus::Disponible
        );
        assert_eq!(
            DeviceCondition::ConDanos.target_device_status(),
            DeviceStatus::Mantenimiento
        );
        assert_eq!(
            DeviceCondition::NoFuncional.target_device_status(),
            DeviceStatus::Mantenimiento
        );
    }

    #[test]
    fn test_condition_roundtrip() {
        for s in ["OPTIMO", "CON_DANOS", "NO_FUNCIONAL"] {
            assert_eq!(s.parse::<DeviceCondition>().unwrap().to_string(), s);
        }
        assert!("REGULAR".parse::<DeviceCondition>().is_err());
    }
}
