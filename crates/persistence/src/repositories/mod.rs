//! Repository implementations.

pub mod assignment;
pub mod audit_log;
pub mod branch;
pub mod device;
pub mod device_request;
pub mod employee;
pub mod lifecycle;
pub mod return_record;

pub use assignment::AssignmentRepository;
pub use audit_log::AuditLogRepository;
pub use branch::BranchRepository;
pub use device::{DeviceFilter, DeviceRepository};
pub use device_request::DeviceRequestRepository;
pub use employee::EmployeeRepository;
pub use lifecycle::{LifecycleRepoError, LifecycleRepository};
pub use return_record::ReturnRepository;

/// Outcome of a delete with referential protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Dependent rows reference the target; nothing was deleted.
    Blocked {
        dependents: i64,
        dependent_kind: &'static str,
    },
}
