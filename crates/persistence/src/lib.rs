//! Persistence layer for Asset Manager.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the transactional lifecycle
//!   dispatcher that applies cross-entity cascades atomically

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
