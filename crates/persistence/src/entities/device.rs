//! Device entity.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::Device;

use super::decode_err;

/// Database entity for devices. `device_type` and `status` hold the canonical
/// uppercase strings.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
    pub id: Uuid,
    pub device_type: String,
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
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeviceEntity {
    pub fn into_domain(self) -> Result<Device, sqlx::Error> {
        Ok(Device {
            id: self.id,
            device_type: self.device_type.parse().map_err(decode_err)?,
            brand: self.brand,
            model: self.model,
            serial_number: self.serial_number,
            imei: self.imei,
            phone_number: self.phone_number,
            invoice_number: self.invoice_number,
            branch_id: self.branch_id,
            intake_date: self.intake_date,
            initial_value: self.initial_value,
            depreciated_value: self.depreciated_value,
            manual_value: self.manual_value,
            status: self.status.parse().map_err(decode_err)?,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
