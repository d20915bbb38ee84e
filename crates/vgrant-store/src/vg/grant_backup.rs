//! Reads one credential batch and its tokens into a `VirtualGrant`.

use vgrant_core::errors::{ExError, VgError};
use vgrant_core::model::{CredentialBatch, CredsBatchStatus, Token, TriggerType, VirtualGrant};
use vgrant_core_types::Sensitive;

use crate::engine::{ColumnType, DbCommand, DbRecord, DbTransaction, StorageEngine};
use crate::errors::{failed_response, Result};

const OP: &str = "backup_credential_batch";

const SELECT_GRANT_ROWS: &str = r#"
    SELECT   cb.creds_id,
             cb.trigger_type,
             cb.trigger_id,
             cb.creds,
             cb.blinded_creds,
             cb.signed_creds,
             cb.public_key,
             cb.batch_proof,
             cb.status,
             ut.token_id,
             ut.token_value,
             ut.public_key,
             ut.value,
             ut.expires_at,
             ut.redeemed_at,
             ut.redeem_id,
             ut.redeem_type,
             ut.reserved_at
    FROM     creds_batch AS cb
    JOIN     unblinded_tokens AS ut
    ON       ut.creds_id = cb.creds_id
"#;

fn record_bindings() -> Vec<ColumnType> {
    vec![
        ColumnType::String, // creds_id
        ColumnType::Int,    // trigger_type
        ColumnType::String, // trigger_id
        ColumnType::String, // creds
        ColumnType::String, // blinded_creds
        ColumnType::String, // signed_creds
        ColumnType::String, // public_key
        ColumnType::String, // batch_proof
        ColumnType::Int,    // status
        ColumnType::Int64,  // token_id
        ColumnType::String, // token_value
        ColumnType::String, // ut.public_key
        ColumnType::Double, // value
        ColumnType::Int64,  // expires_at
        ColumnType::Int64,  // redeemed_at
        ColumnType::String, // redeem_id
        ColumnType::Int64,  // redeem_type
        ColumnType::Int64,  // reserved_at
    ]
}

/// Back up the batch issued for `(trigger_type, trigger_id)`
///
/// Returns `None` when no batch with tokens matches: nothing to back up is a
/// valid outcome. Tokens are ordered by token id. If several batches share
/// the trigger (restored batches all carry an empty trigger id), only the
/// batch owning the lowest token id is returned.
///
/// ## Errors
///
/// - `ExErrorKind::StorageUnavailable`: the read failed
/// - `ExErrorKind::Timeout`: the read hit the engine deadline
/// - `ExErrorKind::CorruptRecord`: a row did not decode
pub async fn backup_credential_batch<E>(
    engine: &E,
    trigger_type: TriggerType,
    trigger_id: &str,
) -> Result<Option<VirtualGrant>>
where
    E: StorageEngine + ?Sized,
{
    let command = DbCommand::read(
        format!(
            "{} WHERE cb.trigger_type = ? AND cb.trigger_id = ? ORDER BY ut.token_id",
            SELECT_GRANT_ROWS
        ),
        record_bindings(),
    )
    .bind(trigger_type.as_i64())
    .bind(trigger_id);

    read_grant(engine, command).await
}

/// Back up a batch by its own id
///
/// Used where the trigger is unknown or ambiguous, such as verifying a
/// restore.
pub async fn backup_credential_batch_by_creds_id<E>(
    engine: &E,
    creds_id: &str,
) -> Result<Option<VirtualGrant>>
where
    E: StorageEngine + ?Sized,
{
    let command = DbCommand::read(
        format!("{} WHERE cb.creds_id = ? ORDER BY ut.token_id", SELECT_GRANT_ROWS),
        record_bindings(),
    )
    .bind(creds_id);

    read_grant(engine, command).await
}

async fn read_grant<E>(engine: &E, command: DbCommand) -> Result<Option<VirtualGrant>>
where
    E: StorageEngine + ?Sized,
{
    let response = engine
        .run_transaction(DbTransaction::new().with_command(command))
        .await;
    if !response.is_ok() {
        tracing::error!(
            error = response.error_message(),
            "Credential batch backup failed: bad response"
        );
        return Err(failed_response(OP, &response));
    }

    let Some(first) = response.records.first() else {
        tracing::info!("Credential batch backup: empty result set");
        return Ok(None);
    };

    let batch = batch_from_record(first).map_err(|e| corrupt(e, first))?;

    let mut tokens = Vec::with_capacity(response.records.len());
    let mut skipped = 0usize;
    for record in &response.records {
        let token = token_from_record(record).map_err(|e| corrupt(e, record))?;
        if token.creds_id != batch.creds_id {
            skipped += 1;
            continue;
        }
        tokens.push(token);
    }
    if skipped > 0 {
        tracing::warn!(
            creds_id = %batch.creds_id,
            skipped,
            "Trigger matched more than one batch; backing up the first"
        );
    }

    tracing::debug!(
        creds_id = %batch.creds_id,
        token_count = tokens.len(),
        "Backed up credential batch"
    );

    Ok(Some(VirtualGrant::new(batch, tokens)))
}

fn corrupt(err: VgError, record: &DbRecord) -> ExError {
    let ex: ExError = err.into();
    ex.with_op(OP)
        .with_entity_id(record.string(0).unwrap_or_default())
}

fn batch_from_record(record: &DbRecord) -> std::result::Result<CredentialBatch, VgError> {
    Ok(CredentialBatch {
        creds_id: record.string(0)?,
        trigger_type: TriggerType::try_from(i64::from(record.int(1)?))?,
        trigger_id: record.string(2)?,
        creds: Sensitive::new(record.string(3)?),
        blinded_creds: Sensitive::new(record.string(4)?),
        signed_creds: Sensitive::new(record.string(5)?),
        public_key: record.string(6)?,
        batch_proof: record.string(7)?,
        status: CredsBatchStatus::try_from(i64::from(record.int(8)?))?,
    })
}

fn token_from_record(record: &DbRecord) -> std::result::Result<Token, VgError> {
    Ok(Token {
        token_id: record.int64(9)?,
        token_value: Sensitive::new(record.string(10)?),
        public_key: record.string(11)?,
        value: record.double(12)?,
        creds_id: record.string(0)?,
        expires_at: record.int64(13)?,
        redeemed_at: record.int64(14)?,
        redeem_id: record.string(15)?,
        redeem_type: TriggerType::try_from(record.int64(16)?)?,
        reserved_at: record.int64(17)?,
    })
}
