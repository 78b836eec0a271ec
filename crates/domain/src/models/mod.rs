//! Domain models for Asset Manager.

pub mod assignment;
pub mod audit_log;
pub mod branch;
pub mod device;
pub mod device_request;
pub mod employee;
pub mod return_record;

pub use assignment::{
    Assignment, AssignmentStatus, CreateAssignmentRequest, DeliveryType, DiscountData,
    LetterStatus, UpdateAssignmentRequest,
};
pub use audit_log::{
    Actor, AuditAction, AuditLogEntry, ChangeSet, CreateAuditLogInput, FieldChange,
    ListAuditLogsQuery,
};
pub use branch::{Branch, CreateBranchRequest, UpdateBranchRequest};
pub use device::{
    ChangeDeviceStatusRequest, CreateDeviceRequest, Device, DeviceSnapshot, DeviceStatus,
    DeviceType, MarkDeviceLostRequest, MarkDeviceRetiredRequest, UpdateDeviceRequest,
};
pub use device_request::{
    CreateDeviceRequestPayload, DeviceRequest, RequestReason, RequestStatus,
    UpdateDeviceRequestPayload,
};
pub use employee::{CreateEmployeeRequest, Employee, UpdateEmployeeRequest};
pub use return_record::{CreateReturnRequest, DeviceCondition, ReturnRecord};
