use serde::{Deserialize, Serialize};

use super::batch::TriggerType;

/// Redemption outcome of one token, as exchanged with the sync layer
///
/// Never carries credential material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpendStatus {
    pub token_id: i64,
    pub redeemed_at: i64,
    pub redeem_type: TriggerType,
}

impl SpendStatus {
    pub fn new(token_id: i64, redeemed_at: i64, redeem_type: TriggerType) -> Self {
        Self {
            token_id,
            redeemed_at,
            redeem_type,
        }
    }
}
