//! Return entity.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::ReturnRecord;

use super::decode_err;

/// Database entity for returns.
#[derive(Debug, Clone, FromRow)]
pub struct ReturnEntity {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub return_date: NaiveDate,
    pub condition: String,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ReturnEntity {
    pub fn into_domain(self) -> Result<ReturnRecord, sqlx::Error> {
        Ok(ReturnRecord {
            id: self.id,
            assignment_id: self.assignment_id,
            return_date: self.return_date,
            condition: self.condition.parse().map_err(decode_err)?,
            notes: self.notes,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}
