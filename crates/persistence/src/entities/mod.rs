//! Database entities (row mappings).
//!
//! Entities mirror table rows one to one; enum-valued columns are stored as
//! their canonical uppercase strings and parsed into domain enums by each
//! entity's `into_domain`.

pub mod assignment;
pub mod audit_log;
pub mod branch;
pub mod device;
pub mod device_request;
pub mod employee;
pub mod return_record;

pub use assignment::AssignmentEntity;
pub use audit_log::AuditLogEntity;
pub use branch::BranchEntity;
pub use device::DeviceEntity;
pub use device_request::DeviceRequestEntity;
pub use employee::EmployeeEntity;
pub use return_record::ReturnEntity;

/// Wraps a row-to-domain parse failure as a decode error.
pub(crate) fn decode_err(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}
