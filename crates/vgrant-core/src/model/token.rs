use serde::{Deserialize, Serialize};
use vgrant_core_types::Sensitive;

use super::batch::TriggerType;

/// A single redeemable unit derived from a credential batch
///
/// Maps one row of `unblinded_tokens`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Token {
    /// Globally unique token id
    pub token_id: i64,
    pub token_value: Sensitive<String>,
    pub public_key: String,
    /// Monetary value of the token
    pub value: f64,
    /// Owning batch
    pub creds_id: String,
    pub expires_at: i64,
    /// 0 = not redeemed
    #[serde(default)]
    pub redeemed_at: i64,
    /// Non-empty with `redeemed_at == 0` means a redemption is in flight
    #[serde(default)]
    pub redeem_id: String,
    #[serde(default)]
    pub redeem_type: TriggerType,
    #[serde(default)]
    pub reserved_at: i64,
}

impl Token {
    /// Create an unredeemed token owned by `creds_id`
    pub fn new(token_id: i64, creds_id: impl Into<String>, value: f64) -> Self {
        Self {
            token_id,
            creds_id: creds_id.into(),
            value,
            ..Self::default()
        }
    }

    /// Copy of this token as it is written by a restore
    ///
    /// In-flight redemption and reservation describe the moment of backup,
    /// they are not replayed.
    pub fn for_restore(&self) -> Self {
        Self {
            redeem_id: String::new(),
            reserved_at: 0,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_restore_clears_redemption_state() {
        let mut token = Token::new(7, "b1", 0.25);
        token.redeem_id = "r".into();
        token.reserved_at = 99;
        token.redeemed_at = 5;
        token.redeem_type = TriggerType::OneOffTip;

        let restored = token.for_restore();
        assert_eq!(restored.redeem_id, "");
        assert_eq!(restored.reserved_at, 0);
        assert_eq!(restored.redeemed_at, 5);
        assert_eq!(restored.redeem_type, TriggerType::OneOffTip);
    }
}
