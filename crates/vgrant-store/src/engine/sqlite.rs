//! SQLite implementation of the storage engine.

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, InterruptHandle, Row};
use vgrant_core::errors::{ExError, ExErrorKind};

use super::command::{ColumnType, CommandKind, DbRecord, DbResponse, DbTransaction, DbValue};
use super::StorageEngine;
use crate::db;
use crate::errors::Result;
use crate::migrations::apply_migrations;

/// Default per-transaction timeout
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Storage engine over a single SQLite connection
///
/// Transactions run on the blocking pool and are serialized by the
/// connection mutex. A transaction still waiting for the connection at its
/// deadline never starts; one already running is interrupted and rolled back.
/// Either way the engine waits for the blocking task before answering, so a
/// `Timeout` response always means nothing was committed.
#[derive(Clone)]
pub struct SqliteEngine {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
    timeout: Duration,
}

impl SqliteEngine {
    /// Wrap an already configured connection
    pub fn new(conn: Connection) -> Self {
        Self {
            interrupt: Arc::new(conn.get_interrupt_handle()),
            conn: Arc::new(Mutex::new(conn)),
            timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Open a database file, configure it and apply migrations
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut conn = db::open(path)?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self::new(conn))
    }

    /// Open a migrated in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self::new(conn))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a closure against the raw connection
    ///
    /// Blocks the calling thread while the connection is busy. Meant for
    /// seeding and inspection, not for the backup/restore paths.
    pub fn with_connection<R>(&self, f: impl FnOnce(&mut Connection) -> R) -> Result<R> {
        let mut guard = self.conn.lock().map_err(|_| {
            ExError::new(ExErrorKind::Internal)
                .with_op("sqlite_connection")
                .with_message("connection mutex poisoned")
        })?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl StorageEngine for SqliteEngine {
    async fn run_transaction(&self, transaction: DbTransaction) -> DbResponse {
        let conn = Arc::clone(&self.conn);
        let control = Arc::new(TxControl::default());
        let task_control = Arc::clone(&control);
        let command_count = transaction.commands.len();
        let mut task =
            tokio::task::spawn_blocking(move || run_blocking(&conn, transaction, &task_control));

        let joined = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                control.cancel(&self.interrupt);
                let joined = task.await;
                if matches!(&joined, Ok(response) if response.is_ok()) {
                    tracing::warn!(
                        timeout_ms = self.timeout.as_millis() as u64,
                        command_count,
                        "SQLite transaction committed past its deadline"
                    );
                }
                joined
            }
        };

        match joined {
            Ok(response) => {
                if response.is_timeout() {
                    tracing::error!(
                        timeout_ms = self.timeout.as_millis() as u64,
                        command_count,
                        "SQLite transaction timed out"
                    );
                } else if !response.is_ok() {
                    tracing::warn!(
                        command_count,
                        error = response.error_message(),
                        "SQLite transaction rolled back"
                    );
                }
                response
            }
            Err(join_err) => {
                tracing::error!(error = %join_err, "SQLite transaction task failed");
                DbResponse::error(format!("transaction task failed: {}", join_err))
            }
        }
    }
}

/// Cancellation state shared between a transaction and its caller
#[derive(Default)]
struct TxControl {
    cancelled: AtomicBool,
    /// Held while the transaction owns the connection and may be executing
    running: Mutex<bool>,
}

impl TxControl {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn set_running(&self, running: bool) {
        *self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = running;
    }

    /// Stop the transaction at its next command, or mid-statement if it is
    /// executing one
    ///
    /// The interrupt is only raised while `running` is set, which the
    /// transaction clears before releasing the connection, so it can never
    /// hit a later transaction.
    fn cancel(&self, interrupt: &InterruptHandle) {
        self.cancelled.store(true, Ordering::SeqCst);
        let running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *running {
            interrupt.interrupt();
        }
    }
}

enum TxError {
    Cancelled,
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for TxError {
    fn from(err: rusqlite::Error) -> Self {
        TxError::Sqlite(err)
    }
}

fn run_blocking(
    conn: &Mutex<Connection>,
    transaction: DbTransaction,
    control: &TxControl,
) -> DbResponse {
    let mut guard = match conn.lock() {
        Ok(guard) => guard,
        Err(_) => return DbResponse::error("connection mutex poisoned"),
    };
    if control.is_cancelled() {
        return DbResponse::timeout("transaction timed out waiting for the connection");
    }

    control.set_running(true);
    let result = execute_all(&mut guard, &transaction, control);
    control.set_running(false);

    match result {
        Ok(records) => DbResponse::ok(records),
        Err(TxError::Cancelled) => DbResponse::timeout("transaction timed out and was rolled back"),
        Err(TxError::Sqlite(_)) if control.is_cancelled() => {
            DbResponse::timeout("transaction interrupted at its deadline and rolled back")
        }
        Err(TxError::Sqlite(e)) => DbResponse::error(e.to_string()),
    }
}

/// Execute every command inside one SQLite transaction
///
/// The transaction rolls back on drop if any command fails or the caller
/// cancels it between commands.
fn execute_all(
    conn: &mut Connection,
    transaction: &DbTransaction,
    control: &TxControl,
) -> std::result::Result<Vec<DbRecord>, TxError> {
    let tx = conn.transaction()?;
    let mut records = Vec::new();

    for command in &transaction.commands {
        if control.is_cancelled() {
            return Err(TxError::Cancelled);
        }
        match command.kind {
            CommandKind::Execute => {
                tx.execute_batch(&command.sql)?;
            }
            CommandKind::Run => {
                tx.execute(
                    &command.sql,
                    params_from_iter(command.bindings.iter().map(to_sql_value)),
                )?;
            }
            CommandKind::Read => {
                let mut stmt = tx.prepare(&command.sql)?;
                let mut rows =
                    stmt.query(params_from_iter(command.bindings.iter().map(to_sql_value)))?;
                while let Some(row) = rows.next()? {
                    records.push(read_record(row, &command.record_bindings)?);
                }
            }
        }
    }

    if control.is_cancelled() {
        return Err(TxError::Cancelled);
    }
    tx.commit()?;
    Ok(records)
}

fn to_sql_value(value: &DbValue) -> Value {
    match value {
        DbValue::Null => Value::Null,
        DbValue::String(s) => Value::Text(s.clone()),
        DbValue::Int(v) => Value::Integer(i64::from(*v)),
        DbValue::Int64(v) => Value::Integer(*v),
        DbValue::Double(v) => Value::Real(*v),
    }
}

fn read_record(row: &Row<'_>, bindings: &[ColumnType]) -> rusqlite::Result<DbRecord> {
    let mut fields = Vec::with_capacity(bindings.len());
    for (index, column_type) in bindings.iter().enumerate() {
        if let ValueRef::Null = row.get_ref(index)? {
            fields.push(DbValue::Null);
            continue;
        }
        let value = match column_type {
            ColumnType::String => DbValue::String(row.get(index)?),
            ColumnType::Int => DbValue::Int(row.get(index)?),
            ColumnType::Int64 => DbValue::Int64(row.get(index)?),
            ColumnType::Double => DbValue::Double(row.get(index)?),
        };
        fields.push(value);
    }
    Ok(DbRecord::new(fields))
}
