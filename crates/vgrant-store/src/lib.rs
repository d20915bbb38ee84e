//! vgrant store - storage engine adapter and the backup/restore components
//!
//! Provides:
//! - The `StorageEngine` trait and its transaction/command protocol
//! - A SQLite engine (`rusqlite`) with embedded migrations
//! - Schema snapshot reader, grant and spend-status backup readers,
//!   grant restore writer and the sync update sink

pub mod db;
pub mod engine;
pub mod errors;
pub mod migrations;
pub mod vg;

// Re-export key types
pub use engine::{SqliteEngine, StorageEngine};
pub use errors::Result;
pub use vg::{RestoreMode, RestoreOptions, RestoreReport, SpendStatusBackup};
