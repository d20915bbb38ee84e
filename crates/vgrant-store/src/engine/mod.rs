//! Storage engine seam.
//!
//! The backup/restore components only ever submit whole transactions and
//! wait for the reply. Any engine that can run a `DbTransaction`
//! all-or-nothing can sit behind this trait; `SqliteEngine` is the bundled
//! implementation.

pub mod command;
pub mod sqlite;

use async_trait::async_trait;

pub use command::{
    ColumnType, CommandKind, DbCommand, DbRecord, DbResponse, DbTransaction, DbValue,
    ResponseStatus,
};
pub use sqlite::SqliteEngine;

/// Asynchronous, transaction-at-a-time storage engine
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Execute every command of `transaction` atomically
    ///
    /// Failures are reported through the response status rather than a
    /// `Result`, the way the engine reports them over its channel.
    async fn run_transaction(&self, transaction: DbTransaction) -> DbResponse;
}

#[async_trait]
impl<E: StorageEngine + ?Sized> StorageEngine for std::sync::Arc<E> {
    async fn run_transaction(&self, transaction: DbTransaction) -> DbResponse {
        (**self).run_transaction(transaction).await
    }
}
