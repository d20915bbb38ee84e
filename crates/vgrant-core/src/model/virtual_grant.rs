use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::batch::CredentialBatch;
use super::token::Token;

/// The backup/restore unit: one credential batch and its tokens
///
/// Tokens produced by a backup are ordered by token id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VirtualGrant {
    pub batch: CredentialBatch,
    pub tokens: Vec<Token>,
}

impl VirtualGrant {
    pub fn new(batch: CredentialBatch, tokens: Vec<Token>) -> Self {
        Self { batch, tokens }
    }

    pub fn creds_id(&self) -> &str {
        &self.batch.creds_id
    }
}

/// One batch with every token the restore input assigned to it
#[derive(Debug, Clone, PartialEq)]
pub struct GrantGroup {
    pub batch: CredentialBatch,
    pub tokens: Vec<Token>,
}

/// Group restore input by batch id
///
/// The input may name the same batch in several grants, interleaved with
/// other batches. Groups come out in order of each batch's first appearance,
/// the batch fields are taken from that first appearance, and tokens keep the
/// order in which they appeared. Every token is re-parented onto its group's
/// `creds_id`.
pub fn group_by_batch(grants: &[VirtualGrant]) -> Vec<GrantGroup> {
    let mut groups: Vec<GrantGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for grant in grants {
        let slot = *index.entry(grant.creds_id()).or_insert_with(|| {
            groups.push(GrantGroup {
                batch: grant.batch.clone(),
                tokens: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        for token in &grant.tokens {
            let mut token = token.clone();
            token.creds_id = group.batch.creds_id.clone();
            group.tokens.push(token);
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::batch::TriggerType;

    fn grant(creds_id: &str, token_ids: &[i64]) -> VirtualGrant {
        VirtualGrant::new(
            CredentialBatch::new(creds_id, TriggerType::AdGrant, ""),
            token_ids
                .iter()
                .map(|id| Token::new(*id, creds_id, 0.25))
                .collect(),
        )
    }

    #[test]
    fn test_interleaved_input_stays_grouped() {
        let input = vec![grant("a", &[1]), grant("b", &[2]), grant("a", &[3])];

        let groups = group_by_batch(&input);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].batch.creds_id, "a");
        let a_ids: Vec<i64> = groups[0].tokens.iter().map(|t| t.token_id).collect();
        assert_eq!(a_ids, vec![1, 3]);

        assert_eq!(groups[1].batch.creds_id, "b");
        let b_ids: Vec<i64> = groups[1].tokens.iter().map(|t| t.token_id).collect();
        assert_eq!(b_ids, vec![2]);
    }

    #[test]
    fn test_batch_fields_come_from_first_appearance() {
        let mut first = grant("a", &[1]);
        first.batch.public_key = "first".into();
        let mut second = grant("a", &[2]);
        second.batch.public_key = "second".into();

        let groups = group_by_batch(&[first, second]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].batch.public_key, "first");
        assert_eq!(groups[0].tokens.len(), 2);
    }

    #[test]
    fn test_tokens_reparented_onto_group() {
        let mut g = grant("a", &[1]);
        g.tokens[0].creds_id = "stale".into();

        let groups = group_by_batch(&[g]);
        assert_eq!(groups[0].tokens[0].creds_id, "a");
    }
}
