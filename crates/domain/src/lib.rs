//! Domain layer for Asset Manager backend.
//!
//! This crate contains:
//! - Domain models (Device, Assignment, ReturnRecord, DeviceRequest, AuditLog)
//! - The device status machine and lifecycle cascade planners
//! - The depreciation calculator
//! - Domain error types

pub mod models;
pub mod services;
