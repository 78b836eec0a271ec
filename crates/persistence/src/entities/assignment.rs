//! Assignment entity.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::Assignment;

use super::decode_err;

/// Database entity for assignments.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentEntity {
    pub id: Uuid,
    pub request_id: Option<Uuid>,
    pub employee_id: Uuid,
    pub device_id: Uuid,
    pub delivery_type: String,
    pub delivery_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub letter_status: String,
    pub letter_signed_at: Option<DateTime<Utc>>,
    pub letter_signed_by: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub discount_data: Option<JsonValue>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssignmentEntity {
    pub fn into_domain(self) -> Result<Assignment, sqlx::Error> {
        Ok(Assignment {
            id: self.id,
            request_id: self.request_id,
            employee_id: self.employee_id,
            device_id: self.device_id,
            delivery_type: self.delivery_type.parse().map_err(decode_err)?,
            delivery_date: self.delivery_date,
            return_date: self.return_date,
            letter_status: self.letter_status.parse().map_err(decode_err)?,
            letter_signed_at: self.letter_signed_at,
            letter_signed_by: self.letter_signed_by,
            status: self.status.parse().map_err(decode_err)?,
            notes: self.notes,
            discount_data: self.discount_data,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
