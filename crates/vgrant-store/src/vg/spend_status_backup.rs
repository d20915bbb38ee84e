//! Reads every token's spend status, refusing while a redemption is in flight.

use vgrant_core::errors::{ExError, ExErrorKind, VgError};
use vgrant_core::model::{SpendStatus, TriggerType};

use crate::engine::{ColumnType, DbCommand, DbRecord, DbTransaction, StorageEngine};
use crate::errors::{failed_response, Result};

const OP: &str = "backup_spend_statuses";

// The guard and the row read are one statement so both see the same state.
// While any redemption is in flight the query yields a single all-NULL row
// and nothing else.
const SELECT_SPEND_STATUSES: &str = r#"
    WITH aux AS (
      SELECT COALESCE(SUM(
               CASE
                 WHEN redeem_id IS NOT NULL AND redeem_id != ''
                      AND COALESCE(redeemed_at, 0) = 0 THEN 1
                 ELSE 0
               END
             ), 0) AS in_progress
      FROM   unblinded_tokens
    )
    SELECT   NULL AS token_id,
             NULL AS redeemed_at,
             NULL AS redeem_type
    FROM     aux
    WHERE    aux.in_progress != 0
    UNION ALL
    SELECT   ut.token_id,
             ut.redeemed_at,
             ut.redeem_type
    FROM     unblinded_tokens AS ut, aux
    WHERE    aux.in_progress = 0
    ORDER BY token_id
"#;

/// Outcome of a spend-status backup
#[derive(Debug, Clone, PartialEq)]
pub enum SpendStatusBackup {
    /// Every token's status, ordered by token id
    Complete(Vec<SpendStatus>),
    /// At least one redemption is uncommitted; retry later
    InProgress,
}

impl SpendStatusBackup {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, SpendStatusBackup::InProgress)
    }

    /// Collapse into a `Result`, reporting `InProgress` as a retryable error
    pub fn into_result(self) -> Result<Vec<SpendStatus>> {
        match self {
            SpendStatusBackup::Complete(statuses) => Ok(statuses),
            SpendStatusBackup::InProgress => Err(ExError::new(ExErrorKind::InProgress)
                .with_op(OP)
                .with_message("a contribution or order is being redeemed")),
        }
    }
}

/// Back up the spend status of every token
///
/// ## Errors
///
/// - `ExErrorKind::StorageUnavailable`: the read failed
/// - `ExErrorKind::Timeout`: the read hit the engine deadline
/// - `ExErrorKind::CorruptRecord`: a stored redeem type is unknown
pub async fn backup_spend_statuses<E>(engine: &E) -> Result<SpendStatusBackup>
where
    E: StorageEngine + ?Sized,
{
    let command = DbCommand::read(
        SELECT_SPEND_STATUSES,
        vec![ColumnType::Int64, ColumnType::Int64, ColumnType::Int64],
    );

    let response = engine
        .run_transaction(DbTransaction::new().with_command(command))
        .await;
    if !response.is_ok() {
        tracing::error!(
            error = response.error_message(),
            "Spend status backup failed: bad response"
        );
        return Err(failed_response(OP, &response));
    }

    let records = response.records;
    if records.first().is_some_and(DbRecord::is_all_null) {
        tracing::info!("Spend status backup refused: a redemption is in progress");
        return Ok(SpendStatusBackup::InProgress);
    }

    let statuses = records
        .iter()
        .map(spend_status_from_record)
        .collect::<std::result::Result<Vec<_>, VgError>>()
        .map_err(|e| ExError::from(e).with_op(OP))?;

    tracing::debug!(count = statuses.len(), "Backed up spend statuses");
    Ok(SpendStatusBackup::Complete(statuses))
}

fn spend_status_from_record(record: &DbRecord) -> std::result::Result<SpendStatus, VgError> {
    Ok(SpendStatus::new(
        record.int64(0)?,
        record.int64(1)?,
        TriggerType::try_from(record.int64(2)?)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_into_result_is_retryable() {
        let err = SpendStatusBackup::InProgress.into_result().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InProgress);
        assert!(err.kind().is_retryable());
    }

    #[test]
    fn test_complete_into_result() {
        let statuses = vec![SpendStatus::new(1, 0, TriggerType::None)];
        let backup = SpendStatusBackup::Complete(statuses.clone());
        assert!(!backup.is_in_progress());
        assert_eq!(backup.into_result().unwrap(), statuses);
    }
}
