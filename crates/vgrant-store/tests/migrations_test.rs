// Integration tests for the embedded vg schema migration

use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_names(conn: &Connection, kind: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = ? AND sql IS NOT NULL ORDER BY name")
        .unwrap();
    stmt.query_map([kind], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    // Given: An empty SQLite database
    let mut conn = setup_test_db();

    // When: Migrations are applied
    let result = vgrant_store::migrations::apply_migrations(&mut conn);

    // Then: They succeed and create both vg tables
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());
    let tables = get_names(&conn, "table");
    assert_eq!(
        tables,
        vec!["creds_batch", "schema_version", "unblinded_tokens"]
    );

    // And: The explicit indices exist
    let indices = get_names(&conn, "index");
    for expected in [
        "creds_batch_trigger_id_index",
        "creds_batch_trigger_type_index",
        "unblinded_tokens_creds_id_index",
        "unblinded_tokens_redeem_id_index",
    ] {
        assert!(
            indices.contains(&expected.to_string()),
            "Missing index: {}",
            expected
        );
    }
}

#[test]
fn test_migration_idempotency() {
    // Given: A database with migrations already applied
    let mut conn = setup_test_db();
    vgrant_store::migrations::apply_migrations(&mut conn).unwrap();

    // When: Migrations run again
    let result = vgrant_store::migrations::apply_migrations(&mut conn);

    // Then: Nothing is re-applied
    assert!(result.is_ok());
    let version_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version_count, 1, "Should have exactly 1 migration applied");
}

#[test]
fn test_migration_records_checksum() {
    let mut conn = setup_test_db();
    vgrant_store::migrations::apply_migrations(&mut conn).unwrap();

    let checksum: String = conn
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = '001_vg_schema'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(checksum.len(), 64, "SHA-256 hex digest");
}

#[test]
fn test_checksum_mismatch_is_rejected() {
    // Given: A recorded checksum that no longer matches the embedded SQL
    let mut conn = setup_test_db();
    vgrant_store::migrations::apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'tampered' WHERE migration_id = '001_vg_schema'",
        [],
    )
    .unwrap();

    // When / Then: Re-applying fails loudly
    let err = vgrant_store::migrations::apply_migrations(&mut conn).unwrap_err();
    assert!(err.message().contains("checksum mismatch"));
}

#[test]
fn test_engine_open_on_file_migrates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rewards.db");

    let engine = vgrant_store::SqliteEngine::open(&path).unwrap();
    drop(engine);

    // Reopening an already migrated file is fine
    let engine = vgrant_store::SqliteEngine::open(&path).unwrap();
    let count: i64 = engine
        .with_connection(|c| {
            c.query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
                .unwrap()
        })
        .unwrap();
    assert_eq!(count, 1);
}
