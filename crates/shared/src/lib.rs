//! Shared utilities and common types for Asset Manager backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Page-based pagination types
//! - Common validation logic for device identifiers
//! - Monetary rounding helpers

pub mod money;
pub mod pagination;
pub mod validation;
