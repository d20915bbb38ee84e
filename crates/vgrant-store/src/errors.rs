//! Error handling for vgrant-store
//!
//! Wraps the vgrant-core ExError facility with store-specific helpers

use vgrant_core::errors::{ExError, ExErrorKind};

use crate::engine::DbResponse;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Engine answered with a non-OK status before anything destructive ran
pub fn storage_unavailable(op: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::StorageUnavailable)
        .with_op(op.to_string())
        .with_message(reason.to_string())
}

/// Non-OK response to a transaction that changes nothing on failure
///
/// A timed-out transaction was rolled back and reports `Timeout`; every other
/// failure reports `StorageUnavailable`.
pub fn failed_response(op: &str, response: &DbResponse) -> ExError {
    if response.is_timeout() {
        ExError::new(ExErrorKind::Timeout)
            .with_op(op.to_string())
            .with_message(response.error_message().to_string())
    } else {
        storage_unavailable(op, response.error_message())
    }
}

/// Restore failed once the swap was planned
pub fn storage_error(op: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::StorageError)
        .with_op(op.to_string())
        .with_message(reason.to_string())
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}
