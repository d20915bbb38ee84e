//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// Get all embedded migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_vg_schema",
        sql: include_str!("../../migrations/001_vg_schema.sql"),
    }]
}

/// Baseline CREATE statements for `table`, indices included
///
/// Taken from the first migration, in file order. Empty for a table the
/// baseline does not create.
pub fn baseline_schema(table: &str) -> Vec<&'static str> {
    let Some(baseline) = get_migrations().into_iter().next() else {
        return Vec::new();
    };
    baseline
        .sql
        .split(';')
        .map(str::trim)
        .filter(|stmt| created_on(stmt) == Some(table))
        .collect()
}

/// Table a CREATE TABLE or CREATE INDEX statement applies to
fn created_on(stmt: &str) -> Option<&str> {
    let words: Vec<&str> = stmt.split_whitespace().collect();
    let name = match words.as_slice() {
        ["CREATE", "TABLE", "IF", "NOT", "EXISTS", name, ..] | ["CREATE", "TABLE", name, ..] => {
            Some(*name)
        }
        ["CREATE", ..] => words
            .iter()
            .position(|w| w.eq_ignore_ascii_case("ON"))
            .and_then(|i| words.get(i + 1))
            .copied(),
        _ => None,
    }?;
    Some(name.split('(').next().unwrap_or(name))
}
