//! Employee entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::Employee;

/// Database entity for employees.
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeEntity {
    pub id: Uuid,
    pub full_name: String,
    pub national_id: String,
    pub email: Option<String>,
    pub position: Option<String>,
    pub branch_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmployeeEntity> for Employee {
    fn from(entity: EmployeeEntity) -> Self {
        Employee {
            id: entity.id,
            full_name: entity.full_name,
            national_id: entity.national_id,
            email: entity.email,
            position: entity.position,
            branch_id: entity.branch_id,
            active: entity.active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
