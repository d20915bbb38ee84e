use serde::{Deserialize, Serialize};
use vgrant_core_types::Sensitive;

use crate::errors::VgError;

/// Why a credential batch was issued
///
/// Also used as the redeem type of a token, which mirrors the trigger that
/// produced the spend. Persisted as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    #[default]
    None,
    AdGrant,
    AutoContribution,
    OneOffTip,
    RecurringTip,
    Payment,
}

impl TriggerType {
    pub fn as_i64(self) -> i64 {
        match self {
            TriggerType::None => 0,
            TriggerType::AdGrant => 1,
            TriggerType::AutoContribution => 2,
            TriggerType::OneOffTip => 3,
            TriggerType::RecurringTip => 4,
            TriggerType::Payment => 5,
        }
    }
}

impl TryFrom<i64> for TriggerType {
    type Error = VgError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TriggerType::None),
            1 => Ok(TriggerType::AdGrant),
            2 => Ok(TriggerType::AutoContribution),
            3 => Ok(TriggerType::OneOffTip),
            4 => Ok(TriggerType::RecurringTip),
            5 => Ok(TriggerType::Payment),
            other => Err(VgError::UnknownTriggerType { value: other }),
        }
    }
}

/// Issuance progress of a credential batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredsBatchStatus {
    #[default]
    None,
    Blinded,
    Signed,
    Finished,
    Over,
    Corrupted,
}

impl CredsBatchStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            CredsBatchStatus::None => 0,
            CredsBatchStatus::Blinded => 1,
            CredsBatchStatus::Signed => 2,
            CredsBatchStatus::Finished => 3,
            CredsBatchStatus::Over => 4,
            CredsBatchStatus::Corrupted => 5,
        }
    }
}

impl TryFrom<i64> for CredsBatchStatus {
    type Error = VgError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CredsBatchStatus::None),
            1 => Ok(CredsBatchStatus::Blinded),
            2 => Ok(CredsBatchStatus::Signed),
            3 => Ok(CredsBatchStatus::Finished),
            4 => Ok(CredsBatchStatus::Over),
            5 => Ok(CredsBatchStatus::Corrupted),
            other => Err(VgError::UnknownBatchStatus { value: other }),
        }
    }
}

/// A group of reward credentials issued together under one trigger
///
/// Maps one row of `creds_batch`. The credential blobs are opaque to this
/// crate and are carried as `Sensitive` so they never reach log output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CredentialBatch {
    /// Unique batch identifier
    pub creds_id: String,

    pub trigger_type: TriggerType,

    /// Event that caused the batch; blank for restored batches
    #[serde(default)]
    pub trigger_id: String,

    pub creds: Sensitive<String>,
    pub blinded_creds: Sensitive<String>,
    pub signed_creds: Sensitive<String>,
    pub public_key: String,
    pub batch_proof: String,
    pub status: CredsBatchStatus,
}

impl CredentialBatch {
    /// Create an empty batch with the given id and trigger
    pub fn new(
        creds_id: impl Into<String>,
        trigger_type: TriggerType,
        trigger_id: impl Into<String>,
    ) -> Self {
        Self {
            creds_id: creds_id.into(),
            trigger_type,
            trigger_id: trigger_id.into(),
            ..Self::default()
        }
    }

    /// Copy of this batch as it is written by a restore
    pub fn for_restore(&self) -> Self {
        Self {
            trigger_id: String::new(),
            ..self.clone()
        }
    }
}
