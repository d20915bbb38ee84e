use async_trait::async_trait;
use vgrant_core::model::{CredentialBatch, CredsBatchStatus, Token, TriggerType, VirtualGrant};
use vgrant_core_types::Sensitive;
use vgrant_store::engine::{DbResponse, DbTransaction, StorageEngine};
use vgrant_store::SqliteEngine;

/// Migrated in-memory engine
#[allow(dead_code)]
pub fn new_engine() -> SqliteEngine {
    SqliteEngine::open_in_memory().expect("Failed to open in-memory engine")
}

/// Batch with every credential field filled in
#[allow(dead_code)]
pub fn batch(creds_id: &str, trigger_id: &str) -> CredentialBatch {
    CredentialBatch {
        creds_id: creds_id.to_string(),
        trigger_type: TriggerType::AdGrant,
        trigger_id: trigger_id.to_string(),
        creds: Sensitive::new(format!("[\"creds-{}\"]", creds_id)),
        blinded_creds: Sensitive::new(format!("[\"blinded-{}\"]", creds_id)),
        signed_creds: Sensitive::new(format!("[\"signed-{}\"]", creds_id)),
        public_key: format!("pk-{}", creds_id),
        batch_proof: format!("proof-{}", creds_id),
        status: CredsBatchStatus::Finished,
    }
}

/// Token with every field filled in
#[allow(dead_code)]
pub fn token(token_id: i64, creds_id: &str) -> Token {
    Token {
        token_id,
        token_value: Sensitive::new(format!("value-{}", token_id)),
        public_key: format!("pk-{}", creds_id),
        value: 0.25,
        creds_id: creds_id.to_string(),
        expires_at: 1_900_000_000,
        redeemed_at: 0,
        redeem_id: String::new(),
        redeem_type: TriggerType::None,
        reserved_at: 0,
    }
}

#[allow(dead_code)]
pub fn grant(creds_id: &str, trigger_id: &str, token_ids: &[i64]) -> VirtualGrant {
    VirtualGrant::new(
        batch(creds_id, trigger_id),
        token_ids.iter().map(|id| token(*id, creds_id)).collect(),
    )
}

/// Insert a batch row directly
#[allow(dead_code)]
pub fn insert_batch(engine: &SqliteEngine, batch: &CredentialBatch) {
    engine
        .with_connection(|conn| {
            conn.execute(
                "INSERT INTO creds_batch (creds_id, trigger_id, trigger_type, creds, \
                 blinded_creds, signed_creds, public_key, batch_proof, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    batch.creds_id,
                    batch.trigger_id,
                    batch.trigger_type.as_i64(),
                    batch.creds.expose(),
                    batch.blinded_creds.expose(),
                    batch.signed_creds.expose(),
                    batch.public_key,
                    batch.batch_proof,
                    batch.status.as_i64(),
                ],
            )
            .expect("insert creds_batch");
        })
        .unwrap();
}

/// Insert a token row directly
#[allow(dead_code)]
pub fn insert_token(engine: &SqliteEngine, token: &Token) {
    engine
        .with_connection(|conn| {
            conn.execute(
                "INSERT INTO unblinded_tokens (token_id, token_value, public_key, value, \
                 creds_id, expires_at, redeemed_at, redeem_id, redeem_type, reserved_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    token.token_id,
                    token.token_value.expose(),
                    token.public_key,
                    token.value,
                    token.creds_id,
                    token.expires_at,
                    token.redeemed_at,
                    token.redeem_id,
                    token.redeem_type.as_i64(),
                    token.reserved_at,
                ],
            )
            .expect("insert unblinded_tokens");
        })
        .unwrap();
}

#[allow(dead_code)]
pub fn insert_grant(engine: &SqliteEngine, grant: &VirtualGrant) {
    insert_batch(engine, &grant.batch);
    for token in &grant.tokens {
        insert_token(engine, token);
    }
}

#[allow(dead_code)]
pub fn count(engine: &SqliteEngine, sql: &str) -> i64 {
    engine
        .with_connection(|conn| conn.query_row(sql, [], |row| row.get(0)).unwrap())
        .unwrap()
}

/// Engine that rejects every transaction
#[allow(dead_code)]
pub struct FailingEngine;

#[async_trait]
impl StorageEngine for FailingEngine {
    async fn run_transaction(&self, _transaction: DbTransaction) -> DbResponse {
        DbResponse::error("engine offline")
    }
}

/// Engine that delegates to SQLite but rejects transactions after the first `ok` ones
#[allow(dead_code)]
pub struct FailAfter {
    pub inner: SqliteEngine,
    pub ok: usize,
    pub seen: std::sync::atomic::AtomicUsize,
}

#[allow(dead_code)]
impl FailAfter {
    pub fn new(inner: SqliteEngine, ok: usize) -> Self {
        Self {
            inner,
            ok,
            seen: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StorageEngine for FailAfter {
    async fn run_transaction(&self, transaction: DbTransaction) -> DbResponse {
        let n = self.seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if n >= self.ok {
            return DbResponse::error("injected failure");
        }
        self.inner.run_transaction(transaction).await
    }
}
