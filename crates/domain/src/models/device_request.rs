//! Device request (pre-approval) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::device::DeviceType;

/// Lifecycle of a device request.
///
/// `COMPLETADA` is reached automatically and irreversibly the moment an
/// assignment referencing the request is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pendiente,
    Aprobada,
    Rechazada,
    Completada,
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDIENTE" => Ok(RequestStatus::Pendiente),
            "APROBADA" => Ok(RequestStatus::Aprobada),
            "RECHAZADA" => Ok(RequestStatus::Rechazada),
            "COMPLETADA" => Ok(RequestStatus::Completada),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestStatus::Pendiente => "PENDIENTE",
            RequestStatus::Aprobada => "APROBADA",
            RequestStatus::Rechazada => "RECHAZADA",
            RequestStatus::Completada => "COMPLETADA",
        };
        write!(f, "{}", s)
    }
}

/// Reason a device is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestReason {
    Cambio,
    NuevaEntrega,
    Robo,
    Practica,
}

impl FromStr for RequestReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CAMBIO" => Ok(RequestReason::Cambio),
            "NUEVA_ENTREGA" => Ok(RequestReason::NuevaEntrega),
            "ROBO" => Ok(RequestReason::Robo),
            "PRACTICA" => Ok(RequestReason::Practica),
            _ => Err(format!("Unknown request reason: {}", s)),
        }
    }
}

impl std::fmt::Display for RequestReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestReason::Cambio => "CAMBIO",
            RequestReason::NuevaEntrega => "NUEVA_ENTREGA",
            RequestReason::Robo => "ROBO",
            RequestReason::Practica => "PRACTICA",
        };
        write!(f, "{}", s)
    }
}

/// A pre-approval record that may precede an assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub reason: RequestReason,
    pub requesting_manager: String,
    pub device_type: DeviceType,
    pub justification: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeviceRequest {
    /// After completion only the justification may be edited.
    pub fn is_locked(&self) -> bool {
        self.status == RequestStatus::Completada
    }
}

/// Request payload for creating a device request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceRequestPayload {
    pub employee_id: Uuid,
    pub branch_id: Option<Uuid>,

    #[serde(default = "default_reason")]
    pub reason: RequestReason,

    #[validate(length(
        min = 2,
        max = 200,
        message = "Requesting manager must be between 2 and 200 characters"
    ))]
    pub requesting_manager: String,

    pub device_type: DeviceType,

    #[validate(length(max = 2000, message = "Justification must be at most 2000 characters"))]
    pub justification: Option<String>,
}

fn default_reason() -> RequestReason {
    RequestReason::NuevaEntrega
}

/// Request payload for updating a device request.
///
/// Once the request is `COMPLETADA`, only `justification` is accepted; the
/// other fields are rejected by the persistence layer.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequestPayload {
    pub status: Option<RequestStatus>,

    #[validate(length(
        min = 2,
        max = 200,
        message = "Requesting manager must be between 2 and 200 characters"
    ))]
    pub requesting_manager: Option<String>,

    #[validate(length(max = 2000, message = "Justification must be at most 2000 characters"))]
    pub justification: Option<String>,
}

impl UpdateDeviceRequestPayload {
    /// Whether the payload touches anything beyond the justification.
    pub fn touches_locked_fields(&self) -> bool {
        self.status.is_some() || self.requesting_manager.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for s in ["PENDIENTE", "APROBADA", "RECHAZADA", "COMPLETADA"] {
            assert_eq!(s.parse::<RequestStatus>().unwrap().to_string(), s);
        }
        assert!("CANCELADA".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_reason_roundtrip() {
        for s in ["CAMBIO", "NUEVA_ENTREGA", "ROBO", "PRACTICA"] {
            assert_eq!(s.parse::<RequestReason>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_update_payload_locked_field_detection() {
        let justification_only = UpdateDeviceRequestPayload {
            status: None,
            requesting_manager: None,
            justification: Some("Replacement approved by IT".to_string()),
        };
        assert!(!justification_only.touches_locked_fields());

        let with_status = UpdateDeviceRequestPayload {
            status: Some(RequestStatus::Aprobada),
            requesting_manager: None,
            justification: None,
        };
        assert!(with_status.touches_locked_fields());
    }
}
