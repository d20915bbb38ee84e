//! Migration framework
//!
//! Provides:
//! - Migration runner with checksums
//! - Idempotent application
//! - Embedded SQL migrations creating the virtual grant tables

mod checksums;
mod embedded;
mod runner;

pub use embedded::baseline_schema;
pub use runner::apply_migrations;
