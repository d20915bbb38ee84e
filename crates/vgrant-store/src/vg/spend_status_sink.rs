//! Applies spend statuses delivered by the sync layer to the live token table.

use vgrant_core::model::SpendStatus;

use crate::engine::{DbCommand, DbTransaction, StorageEngine};
use crate::errors::{failed_response, Result};

const OP: &str = "apply_spend_status_updates";

const UPDATE_SPEND_STATUS: &str =
    "UPDATE unblinded_tokens SET redeemed_at = ?, redeem_type = ? WHERE token_id = ?";

/// Write `updates` onto the matching tokens in one transaction
///
/// Updates for token ids that are not stored match no row and are ignored.
/// Returns the number of updates submitted; an empty list never reaches the
/// engine.
///
/// ## Errors
///
/// - `ExErrorKind::StorageUnavailable`: the engine rejected the transaction;
///   none of the updates were applied
/// - `ExErrorKind::Timeout`: the transaction hit the engine deadline and was
///   rolled back; none of the updates were applied
pub async fn apply_spend_status_updates<E>(engine: &E, updates: &[SpendStatus]) -> Result<usize>
where
    E: StorageEngine + ?Sized,
{
    if updates.is_empty() {
        return Ok(0);
    }

    let mut transaction = DbTransaction::new();
    transaction.extend(updates.iter().map(|status| {
        DbCommand::run(UPDATE_SPEND_STATUS)
            .bind(status.redeemed_at)
            .bind(status.redeem_type.as_i64())
            .bind(status.token_id)
    }));

    let response = engine.run_transaction(transaction).await;
    if !response.is_ok() {
        tracing::error!(
            error = response.error_message(),
            count = updates.len(),
            "Applying spend status updates failed"
        );
        return Err(failed_response(OP, &response));
    }

    tracing::debug!(count = updates.len(), "Applied spend status updates");
    Ok(updates.len())
}
