//! Branch entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::Branch;

/// Database entity for branches.
#[derive(Debug, Clone, FromRow)]
pub struct BranchEntity {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BranchEntity> for Branch {
    fn from(entity: BranchEntity) -> Self {
        Branch {
            id: entity.id,
            name: entity.name,
            code: entity.code,
            address: entity.address,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
