//! Employee domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// An employee who can receive device assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
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

/// Request payload for creating an employee.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    #[validate(length(
        min = 2,
        max = 200,
        message = "Full name must be between 2 and 200 characters"
    ))]
    pub full_name: String,

    #[validate(custom(function = "shared::validation::validate_national_id"))]
    pub national_id: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 100, message = "Position must be at most 100 characters"))]
    pub position: Option<String>,

    pub branch_id: Uuid,
}

/// Request payload for updating an employee.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    #[validate(length(
        min = 2,
        max = 200,
        message = "Full name must be between 2 and 200 characters"
    ))]
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 100, message = "Position must be at most 100 characters"))]
    pub position: Option<String>,

    pub branch_id: Option<Uuid>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_create_employee_valid() {
        let req = CreateEmployeeRequest {
            full_name: "Carla Mendoza".to_string(),
            national_id: "12345678-5".to_string(),
            email: Some("carla.mendoza@example.com".to_string()),
            position: Some("Field Technician".to_string()),
            branch_id: Uuid::new_v4(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_employee_rejects_bad_national_id() {
        let req = CreateEmployeeRequest {
            full_name: "Carla Mendoza".to_string(),
            national_id: "not-a-rut".to_string(),
            email: None,
            position: None,
            branch_id: Uuid::new_v4(),
        };
        assert!(req.validate().is_err());
    }
}
