//! vgrant engine - service facade for virtual grant backup and restore
//!
//! Exposes the four operations the sync layer calls, serializes writers per
//! table set and loads service configuration.

pub mod config;
pub mod queue;
pub mod service;

pub use config::ServiceConfig;
pub use queue::TableLocks;
pub use service::VgBackupRestoreService;
