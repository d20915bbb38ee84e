//! Restores virtual grants into freshly recreated tables.
//!
//! The live tables are renamed to `<table>_<timestamp>` and recreated from
//! their captured schema before the grants are inserted. Old rows are never
//! dropped. A target table that does not exist yet is created from the
//! baseline schema instead.

use serde::{Deserialize, Serialize};
use vgrant_core::errors::{ExError, VgError};
use vgrant_core::model::{group_by_batch, GrantGroup, VirtualGrant};
use vgrant_core::restore::{RestoreMachine, RestorePhase};
use vgrant_core::schema::{plan_table_swap, TableSwapPlan};

use super::schema_reader::read_schema_snapshot;
use crate::engine::{DbCommand, DbTransaction, StorageEngine};
use crate::errors::{storage_error, Result};
use crate::migrations::baseline_schema;

const OP: &str = "restore_grants";

const INSERT_BATCH: &str = r#"
    INSERT INTO creds_batch (
      creds_id,
      trigger_id,
      trigger_type,
      creds,
      blinded_creds,
      signed_creds,
      public_key,
      batch_proof,
      status
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const INSERT_TOKEN: &str = r#"
    INSERT INTO unblinded_tokens (
      token_id,
      token_value,
      public_key,
      value,
      creds_id,
      expires_at,
      redeemed_at,
      redeem_id,
      redeem_type,
      reserved_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// How swap and insert are submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreMode {
    /// Swap and insert share one transaction
    #[default]
    Atomic,
    /// Swap commits first, insert follows in a second transaction
    ///
    /// A failed insert leaves empty recreated tables next to the renamed
    /// originals.
    TwoPhase,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreOptions {
    pub mode: RestoreMode,
    /// Rename suffix; current unix time when unset
    pub timestamp: Option<i64>,
}

impl RestoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: RestoreMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// What a successful restore did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// `(original, renamed)` per table that existed before the restore
    pub renamed_tables: Vec<(String, String)>,
    /// Target tables the catalog did not know about
    pub missing_tables: Vec<String>,
    /// Missing tables created from the baseline schema
    pub created_tables: Vec<String>,
    pub batch_count: usize,
    pub token_count: usize,
    pub timestamp: i64,
}

/// Restore `grants` into the table set `tables`
///
/// Runs schema capture, then the swap and the inserts. Grants are grouped by
/// batch id first, so interleaved input still lands every token under its
/// batch. Restored batches get an empty trigger id and restored tokens an
/// empty redeem id and zero reserved-at.
///
/// ## Errors
///
/// - `ExErrorKind::InvalidInput`: `grants` is empty, or the catalog holds a
///   name that cannot be spliced into DDL
/// - `ExErrorKind::StorageUnavailable` or `ExErrorKind::Timeout`: schema
///   capture failed; nothing changed
/// - `ExErrorKind::StorageError`: the swap or the inserts failed. In
///   two-phase mode the tables may already be renamed.
pub async fn restore_grants<E>(
    engine: &E,
    tables: &[&str],
    grants: &[VirtualGrant],
    options: &RestoreOptions,
) -> Result<RestoreReport>
where
    E: StorageEngine + ?Sized,
{
    if grants.is_empty() {
        return Err(ExError::from(VgError::EmptyRestore).with_op(OP));
    }

    let mut machine = RestoreMachine::new();
    tracing::debug!(restore_phase = %machine.phase(), "Restore started");

    let snapshot = match read_schema_snapshot(engine, tables).await {
        Ok(snapshot) => snapshot,
        Err(e) => return Err(fail(&mut machine, e)),
    };

    let missing_tables: Vec<String> = snapshot
        .missing_tables(tables)
        .into_iter()
        .map(str::to_string)
        .collect();
    let (created_tables, baseline) = baseline_for(&missing_tables);
    if !missing_tables.is_empty() {
        tracing::warn!(
            missing = ?missing_tables,
            created = ?created_tables,
            "Restore target tables not in catalog; skipping their swap"
        );
    }

    let timestamp = options
        .timestamp
        .unwrap_or_else(|| chrono::Utc::now().timestamp());
    let plan = match plan_table_swap(&snapshot, timestamp) {
        Ok(plan) => plan,
        Err(e) => return Err(fail(&mut machine, plan_error(e))),
    };

    machine.advance()?;
    tracing::debug!(
        restore_phase = %machine.phase(),
        step_count = plan.steps.len(),
        timestamp,
        "Schema captured; swap planned"
    );

    let groups = group_by_batch(grants);
    let inserts = insert_commands(&groups);
    let token_count: usize = groups.iter().map(|g| g.tokens.len()).sum();

    match options.mode {
        RestoreMode::Atomic => {
            let mut transaction = swap_transaction(&plan, &baseline);
            transaction.extend(inserts);
            machine.advance()?;

            let response = engine.run_transaction(transaction).await;
            if !response.is_ok() {
                tracing::error!(error = response.error_message(), "Restore failed!");
                return Err(fail(
                    &mut machine,
                    storage_error(OP, response.error_message()),
                ));
            }
        }
        RestoreMode::TwoPhase => {
            let swap = swap_transaction(&plan, &baseline);
            if !swap.is_empty() {
                let response = engine.run_transaction(swap).await;
                if !response.is_ok() {
                    tracing::error!(error = response.error_message(), "Table swap failed");
                    return Err(fail(
                        &mut machine,
                        storage_error(OP, response.error_message()),
                    ));
                }
                machine.mark_structure_changed();
            }
            machine.advance()?;

            let mut transaction = DbTransaction::new();
            transaction.extend(inserts);
            let response = engine.run_transaction(transaction).await;
            if !response.is_ok() {
                tracing::error!(
                    error = response.error_message(),
                    renamed = ?plan.renamed_tables,
                    "Restore inserts failed after swap; recreated tables are empty"
                );
                return Err(fail(
                    &mut machine,
                    storage_error(
                        OP,
                        &format!(
                            "inserts failed after tables were swapped: {}",
                            response.error_message()
                        ),
                    ),
                ));
            }
        }
    }

    machine.advance()?;
    tracing::info!(
        restore_phase = %machine.phase(),
        batch_count = groups.len(),
        token_count,
        "Restore committed"
    );

    Ok(RestoreReport {
        renamed_tables: plan.renamed_tables,
        missing_tables,
        created_tables,
        batch_count: groups.len(),
        token_count,
        timestamp,
    })
}

fn fail(machine: &mut RestoreMachine, err: ExError) -> ExError {
    let from = machine.phase();
    if let Err(e) = machine.fail() {
        return ExError::from(e).with_op(OP).with_source(err);
    }
    tracing::debug!(
        restore_phase = %RestorePhase::Failed,
        failed_in = %from,
        structure_changed = machine.structure_changed(),
        "Restore failed"
    );
    err
}

fn plan_error(err: VgError) -> ExError {
    let table = match &err {
        VgError::InvalidIdentifier { name } => Some(name.clone()),
        _ => None,
    };
    let ex = ExError::from(err).with_op(OP);
    match table {
        Some(name) => ex.with_table(name),
        None => ex,
    }
}

/// Baseline DDL for the missing tables that have one
fn baseline_for(missing: &[String]) -> (Vec<String>, Vec<&'static str>) {
    let mut created = Vec::new();
    let mut statements = Vec::new();
    for table in missing {
        let ddl = baseline_schema(table);
        if !ddl.is_empty() {
            created.push(table.clone());
            statements.extend(ddl);
        }
    }
    (created, statements)
}

fn swap_transaction(plan: &TableSwapPlan, baseline: &[&str]) -> DbTransaction {
    let mut transaction = DbTransaction::new();
    transaction.extend(plan.statements().into_iter().map(DbCommand::execute));
    transaction.extend(baseline.iter().map(|sql| DbCommand::execute(*sql)));
    transaction
}

fn insert_commands(groups: &[GrantGroup]) -> Vec<DbCommand> {
    let mut commands = Vec::with_capacity(groups.iter().map(|g| g.tokens.len() + 1).sum());

    for group in groups {
        let batch = group.batch.for_restore();
        commands.push(
            DbCommand::run(INSERT_BATCH)
                .bind(batch.creds_id.as_str())
                .bind(batch.trigger_id.as_str())
                .bind(batch.trigger_type.as_i64())
                .bind(batch.creds.expose().as_str())
                .bind(batch.blinded_creds.expose().as_str())
                .bind(batch.signed_creds.expose().as_str())
                .bind(batch.public_key.as_str())
                .bind(batch.batch_proof.as_str())
                .bind(batch.status.as_i64()),
        );

        for token in &group.tokens {
            let token = token.for_restore();
            commands.push(
                DbCommand::run(INSERT_TOKEN)
                    .bind(token.token_id)
                    .bind(token.token_value.expose().as_str())
                    .bind(token.public_key.as_str())
                    .bind(token.value)
                    .bind(token.creds_id.as_str())
                    .bind(token.expires_at)
                    .bind(token.redeemed_at)
                    .bind(token.redeem_id.as_str())
                    .bind(token.redeem_type.as_i64())
                    .bind(token.reserved_at),
            );
        }
    }

    commands
}
