//! Virtual grant backup and restore against a `StorageEngine`.
//!
//! Every function here is one logical operation made of one or more
//! transactions submitted in strict sequence. None of them retries.

pub mod grant_backup;
pub mod restore_writer;
pub mod schema_reader;
pub mod spend_status_backup;
pub mod spend_status_sink;

pub use grant_backup::{backup_credential_batch, backup_credential_batch_by_creds_id};
pub use restore_writer::{restore_grants, RestoreMode, RestoreOptions, RestoreReport};
pub use schema_reader::read_schema_snapshot;
pub use spend_status_backup::{backup_spend_statuses, SpendStatusBackup};
pub use spend_status_sink::apply_spend_status_updates;

/// `?, ?, ?` for an IN list of `count` parameters
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
