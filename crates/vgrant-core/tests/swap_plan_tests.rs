// Table swap planning: statement order, verbatim replay, rename suffixes

use vgrant_core::errors::ExErrorKind;
use vgrant_core::schema::{plan_table_swap, SchemaSnapshot, SwapStep};
use vgrant_core::ExError;

const CREDS_SQL: &str = "CREATE TABLE creds_batch (creds_id TEXT PRIMARY KEY NOT NULL)";
const TOKENS_SQL: &str = "CREATE TABLE unblinded_tokens (token_id INTEGER PRIMARY KEY NOT NULL, creds_id TEXT)";
const INDEX_SQL: &str = "CREATE INDEX unblinded_tokens_creds_id_index ON unblinded_tokens (creds_id)";

fn vg_snapshot() -> SchemaSnapshot {
    SchemaSnapshot::new()
        .with_table("unblinded_tokens", TOKENS_SQL)
        .with_table("creds_batch", CREDS_SQL)
        .with_index("unblinded_tokens_creds_id_index", INDEX_SQL)
}

fn step_rank(step: &SwapStep) -> u8 {
    match step {
        SwapStep::RenameTable { .. } => 0,
        SwapStep::DropIndex { .. } => 1,
        SwapStep::CreateTable { .. } => 2,
        SwapStep::CreateIndex { .. } => 3,
    }
}

#[test]
fn test_steps_follow_rename_drop_create_order() {
    let plan = plan_table_swap(&vg_snapshot(), 1_700_000_000).unwrap();

    assert_eq!(plan.steps.len(), 6);
    let ranks: Vec<u8> = plan.steps.iter().map(step_rank).collect();
    let mut sorted = ranks.clone();
    sorted.sort();
    assert_eq!(ranks, sorted, "steps must be grouped rename/drop/create/index");
}

#[test]
fn test_statements_rename_with_timestamp_suffix() {
    let plan = plan_table_swap(&vg_snapshot(), 1_700_000_000).unwrap();
    let statements = plan.statements();

    assert_eq!(
        statements[0],
        "ALTER TABLE creds_batch RENAME TO creds_batch_1700000000"
    );
    assert_eq!(
        statements[1],
        "ALTER TABLE unblinded_tokens RENAME TO unblinded_tokens_1700000000"
    );
    assert_eq!(
        statements[2],
        "DROP INDEX IF EXISTS unblinded_tokens_creds_id_index"
    );
    assert_eq!(
        plan.renamed_tables,
        vec![
            (
                "creds_batch".to_string(),
                "creds_batch_1700000000".to_string()
            ),
            (
                "unblinded_tokens".to_string(),
                "unblinded_tokens_1700000000".to_string()
            ),
        ]
    );
}

#[test]
fn test_captured_text_is_replayed_verbatim() {
    let plan = plan_table_swap(&vg_snapshot(), 1).unwrap();
    let statements = plan.statements();

    assert!(statements.contains(&CREDS_SQL.to_string()));
    assert!(statements.contains(&TOKENS_SQL.to_string()));
    assert_eq!(statements.last().unwrap(), INDEX_SQL);
}

#[test]
fn test_plan_never_drops_a_table() {
    let plan = plan_table_swap(&vg_snapshot(), 1).unwrap();
    for sql in plan.statements() {
        assert!(
            !sql.to_uppercase().starts_with("DROP TABLE"),
            "unexpected table drop: {}",
            sql
        );
    }
}

#[test]
fn test_invalid_table_name_is_rejected() {
    let snapshot = SchemaSnapshot::new().with_table("creds_batch; DROP TABLE x", "CREATE TABLE y (a)");

    let err: ExError = plan_table_swap(&snapshot, 1).unwrap_err().into();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_invalid_index_name_is_rejected() {
    let snapshot = vg_snapshot().with_index("bad name", "CREATE INDEX z ON creds_batch (creds_id)");
    assert!(plan_table_swap(&snapshot, 1).is_err());
}
