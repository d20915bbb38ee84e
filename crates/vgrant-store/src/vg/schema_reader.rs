//! Captures CREATE statements for a table set from the SQLite catalog.

use vgrant_core::schema::SchemaSnapshot;

use super::placeholders;
use crate::engine::{ColumnType, DbCommand, DbRecord, DbTransaction, StorageEngine};
use crate::errors::{failed_response, Result};

const OP: &str = "read_schema_snapshot";

/// Read the creation statements of `tables` and of their explicit indices
///
/// Issues two read transactions, tables first. Indices SQLite creates
/// implicitly (primary keys, UNIQUE) have a NULL statement and are skipped.
/// Tables unknown to the catalog are simply absent from the snapshot.
///
/// ## Errors
///
/// - `ExErrorKind::StorageUnavailable`: either catalog query failed
/// - `ExErrorKind::Timeout`: the catalog query hit the engine deadline
/// - `ExErrorKind::CorruptRecord`: a catalog row did not decode
pub async fn read_schema_snapshot<E>(engine: &E, tables: &[&str]) -> Result<SchemaSnapshot>
where
    E: StorageEngine + ?Sized,
{
    let mut snapshot = SchemaSnapshot::new();
    if tables.is_empty() {
        return Ok(snapshot);
    }

    let table_rows = read_catalog(
        engine,
        format!(
            "SELECT tbl_name, sql FROM sqlite_master WHERE tbl_name IN ({}) AND type = 'table'",
            placeholders(tables.len())
        ),
        tables,
        "Couldn't get CREATE TABLE statements for tables",
    )
    .await?;
    for record in &table_rows {
        snapshot
            .tables
            .insert(record.string(0)?, record.string(1)?);
    }

    let index_rows = read_catalog(
        engine,
        format!(
            "SELECT name, sql FROM sqlite_master WHERE tbl_name IN ({}) AND type = 'index' AND sql IS NOT NULL",
            placeholders(tables.len())
        ),
        tables,
        "Couldn't get CREATE INDEX statements for tables",
    )
    .await?;
    for record in &index_rows {
        snapshot
            .indices
            .insert(record.string(0)?, record.string(1)?);
    }

    tracing::debug!(
        table_count = snapshot.tables.len(),
        index_count = snapshot.indices.len(),
        "Captured schema snapshot"
    );

    Ok(snapshot)
}

async fn read_catalog<E>(
    engine: &E,
    sql: String,
    tables: &[&str],
    failure: &str,
) -> Result<Vec<DbRecord>>
where
    E: StorageEngine + ?Sized,
{
    let command = tables.iter().fold(
        DbCommand::read(sql, vec![ColumnType::String, ColumnType::String]),
        |cmd, table| cmd.bind(*table),
    );

    let response = engine
        .run_transaction(DbTransaction::new().with_command(command))
        .await;
    if !response.is_ok() {
        tracing::error!(error = response.error_message(), "{}", failure);
        return Err(failed_response(OP, &response)
            .with_message(format!("{}: {}", failure, response.error_message())));
    }

    Ok(response.records)
}
