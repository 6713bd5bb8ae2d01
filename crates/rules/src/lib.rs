//! Apply-rule evaluation and object synthesis.
//!
//! This crate provides:
//! - Pre-compiled expression trees with a small evaluator
//! - Apply rules that derive Services, Dependencies, Notifications and
//!   ScheduledDowntimes from existing Hosts and Services
//! - An object registry with atomic identity checks
//! - A filesystem loader for YAML object and rule documents
//! - A parallel apply engine driving whole passes

pub mod apply;
pub mod expr;
pub mod loader;
pub mod schema;
pub mod store;
