//! Device request entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::DeviceRequest;

use super::decode_err;

/// Database entity for device requests.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceRequestEntity {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub reason: String,
    pub requesting_manager: String,
    pub device_type: String,
    pub justification: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeviceRequestEntity {
    pub fn into_domain(self) -> Result<DeviceRequest, sqlx::Error> {
        Ok(DeviceRequest {
            id: self.id,
            employee_id: self.employee_id,
            branch_id: self.branch_id,
            reason: self.reason.parse().map_err(decode_err)?,
            requesting_manager: self.requesting_manager,
            device_type: self.device_type.parse().map_err(decode_err)?,
            justification: self.justification,
            requested_at: self.requested_at,
            status: self.status.parse().map_err(decode_err)?,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
