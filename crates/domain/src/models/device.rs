//! Device domain model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Equipment categories tracked by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Laptop,
    Desktop,
    Telefono,
    Tablet,
    Tv,
    Sim,
    Accesorio,
}

impl DeviceType {
    /// Types that must carry a serial number.
    pub fn requires_serial(&self) -> bool {
        matches!(
            self,
            DeviceType::Laptop
                | DeviceType::Desktop
                | DeviceType::Telefono
                | DeviceType::Tablet
                | DeviceType::Tv
        )
    }

    /// Types that must carry a model name.
    pub fn requires_model(&self) -> bool {
        matches!(
            self,
            DeviceType::Laptop | DeviceType::Desktop | DeviceType::Telefono | DeviceType::Tablet
        )
    }

    /// Types that may carry an IMEI.
    pub fn allows_imei(&self) -> bool {
        matches!(self, DeviceType::Telefono | DeviceType::Tablet)
    }

    /// Types that must carry a phone number.
    pub fn requires_phone_number(&self) -> bool {
        matches!(self, DeviceType::Sim)
    }

    /// Types whose age and monetary value are tracked for depreciation.
    pub fn is_value_tracked(&self) -> bool {
        matches!(
            self,
            DeviceType::Laptop | DeviceType::Desktop | DeviceType::Telefono | DeviceType::Tablet
        )
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceType::Laptop => "Laptop",
            DeviceType::Desktop => "Desktop",
            DeviceType::Telefono => "Teléfono Móvil",
            DeviceType::Tablet => "Tablet",
            DeviceType::Tv => "TV",
            DeviceType::Sim => "SIM Card",
            DeviceType::Accesorio => "Accesorio",
        }
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LAPTOP" => Ok(DeviceType::Laptop),
            "DESKTOP" => Ok(DeviceType::Desktop),
            "TELEFONO" => Ok(DeviceType::Telefono),
            "TABLET" => Ok(DeviceType::Tablet),
            "TV" => Ok(DeviceType::Tv),
            "SIM" => Ok(DeviceType::Sim),
            "ACCESORIO" => Ok(DeviceType::Accesorio),
            _ => Err(format!("Unknown device type: {}", s)),
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeviceType::Laptop => "LAPTOP",
            DeviceType::Desktop => "DESKTOP",
            DeviceType::Telefono => "TELEFONO",
            DeviceType::Tablet => "TABLET",
            DeviceType::Tv => "TV",
            DeviceType::Sim => "SIM",
            DeviceType::Accesorio => "ACCESORIO",
        };
        write!(f, "{}", s)
    }
}

/// Operational status of a device.
///
/// `BAJA` and `ROBO` are terminal: no transition may leave them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Disponible,
    Asignado,
    Mantenimiento,
    Baja,
    Robo,
}

impl DeviceStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeviceStatus::Baja | DeviceStatus::Robo)
    }

    /// All status values, in display order.
    pub fn all() -> [DeviceStatus; 5] {
        [
            DeviceStatus::Disponible,
            DeviceStatus::Asignado,
            DeviceStatus::Mantenimiento,
            DeviceStatus::Baja,
            DeviceStatus::Robo,
        ]
    }
}

impl FromStr for DeviceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DISPONIBLE" => Ok(DeviceStatus::Disponible),
            "ASIGNADO" => Ok(DeviceStatus::Asignado),
            "MANTENIMIENTO" => Ok(DeviceStatus::Mantenimiento),
            "BAJA" => Ok(DeviceStatus::Baja),
            "ROBO" => Ok(DeviceStatus::Robo),
            _ => Err(format!("Unknown device status: {}", s)),
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeviceStatus::Disponible => "DISPONIBLE",
            DeviceStatus::Asignado => "ASIGNADO",
            DeviceStatus::Mantenimiento => "MANTENIMIENTO",
            DeviceStatus::Baja => "BAJA",
            DeviceStatus::Robo => "ROBO",
        };
        write!(f, "{}", s)
    }
}

/// A tracked physical asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: Uuid,
    pub device_type: DeviceType,
    pub brand: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub imei: Option<String>,
    pub phone_number: Option<String>,
    pub invoice_number: Option<String>,
    pub branch_id: Uuid,
    pub intake_date: NaiveDate,
    pub initial_value: Option<Decimal>,
    pub depreciated_value: Option<Decimal>,
    pub manual_value: bool,
    pub status: DeviceStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// The serial number or IMEI, whichever identifies this device.
    pub fn identifier(&self) -> &str {
        self.serial_number
            .as_deref()
            .or(self.imei.as_deref())
            .unwrap_or("N/A")
    }

    /// Human-readable label used in audit payloads and letters.
    pub fn label(&self) -> String {
        format!(
            "{} - {} {} ({})",
            self.device_type.label(),
            self.brand,
            self.model.as_deref().unwrap_or(""),
            self.identifier()
        )
    }

    /// Captures the denormalized snapshot embedded in assignments when the
    /// device goes through a terminal loss transition.
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            device_id: self.id,
            device_type: self.device_type,
            brand: self.brand.clone(),
            model: self.model.clone(),
            serial_number: self.serial_number.clone(),
            imei: self.imei.clone(),
        }
    }
}

/// Denormalized copy of a device's descriptive fields, embedded in an
/// assignment's discount data so historical reports survive catalog removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    pub device_id: Uuid,
    pub device_type: DeviceType,
    pub brand: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub imei: Option<String>,
}

impl DeviceSnapshot {
    /// Same label shape as a live device.
    pub fn label(&self) -> String {
        format!(
            "{} - {} {} ({})",
            self.device_type.label(),
            self.brand,
            self.model.as_deref().unwrap_or(""),
            self.serial_number
                .as_deref()
                .or(self.imei.as_deref())
                .unwrap_or("N/A")
        )
    }
}

/// Request payload for registering a device.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceRequest {
    pub device_type: DeviceType,

    #[validate(length(min = 1, max = 50, message = "Brand must be between 1 and 50 characters"))]
    pub brand: String,

    #[validate(length(max = 100, message = "Model must be at most 100 characters"))]
    pub model: Option<String>,

    #[validate(custom(function = "shared::validation::validate_serial_number"))]
    pub serial_number: Option<String>,

    #[validate(custom(function = "shared::validation::validate_imei"))]
    pub imei: Option<String>,

    #[validate(custom(function = "shared::validation::validate_phone_number"))]
    pub phone_number: Option<String>,

    #[validate(length(max = 50, message = "Invoice number must be at most 50 characters"))]
    pub invoice_number: Option<String>,

    pub branch_id: Uuid,
    pub intake_date: NaiveDate,
    pub initial_value: Option<Decimal>,
}

impl CreateDeviceRequest {
    /// Full validation: field-level rules plus the per-type requirement matrix.
    ///
    /// | Type      | serial | imei     | model    | phone_number |
    /// |-----------|--------|----------|----------|--------------|
    /// | LAPTOP    | req.   | -        | req.     | -            |
    /// | DESKTOP   | req.   | -        | req.     | -            |
    /// | TELEFONO  | req.   | optional | req.     | optional     |
    /// | TABLET    | req.   | optional | req.     | -            |
    /// | TV        | req.   | -        | optional | -            |
    /// | SIM       | -      | -        | optional | req.         |
    /// | ACCESORIO | -      | -        | optional | -            |
    pub fn validate_payload(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };

        if self.device_type.requires_serial() && blank(&self.serial_number) {
            errors.add(
                "serial_number",
                required_error(
                    "serial_number_required",
                    format!("Serial number is required for {}", self.device_type),
                ),
            );
        }
        if self.device_type.requires_model() && blank(&self.model) {
            errors.add(
                "model",
                required_error(
                    "model_required",
                    format!("Model is required for {}", self.device_type),
                ),
            );
        }
        if self.device_type.requires_phone_number() && blank(&self.phone_number) {
            errors.add(
                "phone_number",
                required_error(
                    "phone_number_required",
                    "Phone number is required for SIM cards".to_string(),
                ),
            );
        }
        if self.imei.is_some() && !self.device_type.allows_imei() {
            errors.add(
                "imei",
                required_error(
                    "imei_not_applicable",
                    format!("IMEI is not applicable for {}", self.device_type),
                ),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

fn required_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Request payload for updating a device's descriptive fields.
///
/// Status is never updated through this payload; it only changes through the
/// status machine.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequest {
    #[validate(length(min = 1, max = 50, message = "Brand must be between 1 and 50 characters"))]
    pub brand: Option<String>,

    #[validate(length(max = 100, message = "Model must be at most 100 characters"))]
    pub model: Option<String>,

    #[validate(custom(function = "shared::validation::validate_phone_number"))]
    pub phone_number: Option<String>,

    #[validate(length(max = 50, message = "Invoice number must be at most 50 characters"))]
    pub invoice_number: Option<String>,

    pub branch_id: Option<Uuid>,
    pub initial_value: Option<Decimal>,

    /// Setting this marks the device value as a manual override.
    pub depreciated_value: Option<Decimal>,
}

/// Request payload for an explicit status change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDeviceStatusRequest {
    pub status: DeviceStatus,
}

/// Request payload for marking a device lost (ROBO).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkDeviceLostRequest {
    #[validate(length(min = 1, max = 500, message = "Context must be between 1 and 500 characters"))]
    pub context: String,
}

/// Request payload for retiring a device (BAJA).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkDeviceRetiredRequest {
    #[validate(length(min = 1, max = 500, message = "Reason must be between 1 and 500 characters"))]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request(device_type: DeviceType) -> CreateDeviceRequest {
        CreateDeviceRequest {
            device_type,
            brand: "Lenovo".to_string(),
            model: Some("ThinkPad T14".to_string()),
            serial_number: Some("PF-3XK1T9".to_string()),
            imei: None,
            phone_number: None,
            invoice_number: None,
            branch_id: Uuid::new_v4(),
            intake_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            initial_value: Some("850000".parse().unwrap()),
        }
    }

    #[test]
    fn test_status_terminal_states() {
        assert!(DeviceStatus::Baja.is_terminal());
        assert!(DeviceStatus::Robo.is_terminal());
        assert!(!DeviceStatus::Disponible.is_terminal());
        assert!(!DeviceStatus::Asignado.is_terminal());
        assert!(!DeviceStatus::Mantenimiento.is_terminal());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in DeviceStatus::all() {
            assert_eq!(status.to_string().parse::<DeviceStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_laptop_requires_serial_and_model() {
        let mut req = base_request(DeviceType::Laptop);
        req.serial_number = None;
        req.model = None;
        let err = req.validate_payload().unwrap_err();
        assert!(err.field_errors().contains_key("serial_number"));
        assert!(err.field_errors().contains_key("model"));
    }

    #[test]
    fn test_sim_requires_phone_number() {
        let mut req = base_request(DeviceType::Sim);
        req.serial_number = None;
        req.model = None;
        let err = req.validate_payload().unwrap_err();
        assert!(err.field_errors().contains_key("phone_number"));

        req.phone_number = Some("+56 9 1234 5678".to_string());
        assert!(req.validate_payload().is_ok());
    }

    #[test]
    fn test_accesorio_has_no_identifier_requirements() {
        let mut req = base_request(DeviceType::Accesorio);
        req.serial_number = None;
        req.model = None;
        assert!(req.validate_payload().is_ok());
    }

    #[test]
    fn test_imei_rejected_for_laptop() {
        let mut req = base_request(DeviceType::Laptop);
        req.imei = Some("490154203237518".to_string());
        let err = req.validate_payload().unwrap_err();
        assert!(err.field_errors().contains_key("imei"));
    }

    #[test]
    fn test_telefono_accepts_imei() {
        let mut req = base_request(DeviceType::Telefono);
        req.imei = Some("490154203237518".to_string());
        assert!(req.validate_payload().is_ok());
    }

    #[test]
    fn test_device_label_prefers_serial() {
        let device = Device {
            id: Uuid::new_v4(),
            device_type: DeviceType::Telefono,
            brand: "Samsung".to_string(),
            model: Some("Galaxy S23".to_string()),
            serial_number: Some("RF8X1234".to_string()),
            imei: Some("490154203237518".to_string()),
            phone_number: None,
            invoice_number: None,
            branch_id: Uuid::new_v4(),
            intake_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            initial_value: None,
            depreciated_value: None,
            manual_value: false,
            status: DeviceStatus::Disponible,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(device.label(), "Teléfono Móvil - Samsung Galaxy S23 (RF8X1234)");
    }

    #[test]
    fn test_snapshot_carries_descriptive_fields() {
        let device = Device {
            id: Uuid::new_v4(),
            device_type: DeviceType::Laptop,
            brand: "Dell".to_string(),
            model: Some("Latitude 5440".to_string()),
            serial_number: Some("DL-9912".to_string()),
            imei: None,
            phone_number: None,
            invoice_number: None,
            branch_id: Uuid::new_v4(),
            intake_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            initial_value: None,
            depreciated_value: None,
            manual_value: false,
            status: DeviceStatus::Asignado,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let snapshot = device.snapshot();
        assert_eq!(snapshot.device_id, device.id);
        assert_eq!(snapshot.brand, "Dell");
        assert_eq!(snapshot.serial_number.as_deref(), Some("DL-9912"));
        assert_eq!(snapshot.label(), device.label());
    }
}
