//! Backup/restore service called by the sync layer.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use vgrant_core::errors::Result;
use vgrant_core::logging_facility;
use vgrant_core::model::{SpendStatus, TriggerType, VirtualGrant};
use vgrant_core::schema::VG_TABLES;
use vgrant_core::{log_op_end, log_op_error, log_op_start};
use vgrant_store::vg;
use vgrant_store::{
    RestoreMode, RestoreOptions, RestoreReport, SpendStatusBackup, SqliteEngine, StorageEngine,
};

use crate::config::ServiceConfig;
use crate::queue::TableLocks;

/// Facade over the vg components
///
/// Every operation runs against one table set. Backups hold shared access
/// to it; restore and sync hold exclusive access, so a sync update can never
/// land between a restore's schema capture and its inserts.
///
/// Clones share the engine and the writer queue.
pub struct VgBackupRestoreService<E: StorageEngine = SqliteEngine> {
    engine: Arc<E>,
    locks: Arc<TableLocks>,
    tables: Vec<String>,
    restore_mode: RestoreMode,
}

impl<E: StorageEngine> Clone for VgBackupRestoreService<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            locks: Arc::clone(&self.locks),
            tables: self.tables.clone(),
            restore_mode: self.restore_mode,
        }
    }
}

impl VgBackupRestoreService<SqliteEngine> {
    /// Open the configured database and initialize logging
    ///
    /// # Errors
    ///
    /// `ExErrorKind::Persistence` if the database cannot be opened or
    /// migrated.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        logging_facility::init(config.log_profile);

        let engine = SqliteEngine::open(&config.database_path)?
            .with_timeout(config.transaction_timeout());
        tracing::info!(
            database_path = %config.database_path.display(),
            timeout_ms = config.transaction_timeout_ms,
            restore_mode = ?config.restore_mode,
            "Opened vg backup/restore service"
        );

        Ok(Self::new(engine).with_restore_mode(config.restore_mode))
    }
}

impl<E: StorageEngine> VgBackupRestoreService<E> {
    pub fn new(engine: E) -> Self {
        Self::with_shared(Arc::new(engine), Arc::new(TableLocks::new()))
    }

    /// Build on an engine and a writer queue shared with other services
    pub fn with_shared(engine: Arc<E>, locks: Arc<TableLocks>) -> Self {
        Self {
            engine,
            locks,
            tables: VG_TABLES.iter().map(|t| t.to_string()).collect(),
            restore_mode: RestoreMode::default(),
        }
    }

    pub fn with_restore_mode(mut self, mode: RestoreMode) -> Self {
        self.restore_mode = mode;
        self
    }

    /// Override the table set restores swap
    pub fn with_tables(mut self, tables: &[&str]) -> Self {
        self.tables = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn tables(&self) -> Vec<&str> {
        self.tables.iter().map(String::as_str).collect()
    }

    /// Back up the batch issued for a trigger; `None` when there is none
    ///
    /// # Errors
    ///
    /// `StorageUnavailable`, `Timeout` or `CorruptRecord`.
    pub async fn backup_credential_batch(
        &self,
        trigger_type: TriggerType,
        trigger_id: &str,
    ) -> Result<Option<VirtualGrant>> {
        let lock = self.locks.lock_for(&self.tables());
        let _shared = lock.read().await;

        instrumented(
            "backup_credential_batch",
            vg::backup_credential_batch(self.engine.as_ref(), trigger_type, trigger_id),
        )
        .await
    }

    /// Back up every token's spend status
    ///
    /// # Errors
    ///
    /// `StorageUnavailable`, `Timeout` or `CorruptRecord`. A redemption in flight is
    /// reported as `SpendStatusBackup::InProgress`, not as an error.
    pub async fn backup_spend_statuses(&self) -> Result<SpendStatusBackup> {
        let lock = self.locks.lock_for(&self.tables());
        let _shared = lock.read().await;

        instrumented(
            "backup_spend_statuses",
            vg::backup_spend_statuses(self.engine.as_ref()),
        )
        .await
    }

    /// Restore grants into fresh tables, keeping the old ones renamed
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty list, `StorageUnavailable` when the schema
    /// could not be captured, `StorageError` once the swap was attempted.
    pub async fn restore_grants(&self, grants: &[VirtualGrant]) -> Result<RestoreReport> {
        let tables = self.tables();
        let lock = self.locks.lock_for(&tables);
        let _exclusive = lock.write().await;

        let options = RestoreOptions::new().with_mode(self.restore_mode);
        instrumented(
            "restore_grants",
            vg::restore_grants(self.engine.as_ref(), &tables, grants, &options),
        )
        .await
    }

    /// Apply spend statuses received from another device
    ///
    /// # Errors
    ///
    /// `StorageUnavailable` or `Timeout`; nothing was applied.
    pub async fn apply_spend_status_updates(&self, updates: &[SpendStatus]) -> Result<usize> {
        let lock = self.locks.lock_for(&self.tables());
        let _exclusive = lock.write().await;

        instrumented(
            "apply_spend_status_updates",
            vg::apply_spend_status_updates(self.engine.as_ref(), updates),
        )
        .await
    }
}

async fn instrumented<T, F>(op: &'static str, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    log_op_start!(op);

    let result = operation.await;
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => {
            log_op_end!(op, duration_ms = duration_ms);
        }
        Err(e) => {
            log_op_error!(op, e.clone(), duration_ms = duration_ms);
        }
    }

    result
}
