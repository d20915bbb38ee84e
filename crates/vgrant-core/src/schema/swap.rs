//! Table swap planning.
//!
//! Order is fixed: rename every table aside, drop every captured index,
//! recreate every table, recreate every index. Renamed indices stay attached
//! to the renamed tables under their old names, which is why they are
//! dropped before the fresh ones are created.

use crate::errors::VgError;

use super::snapshot::SchemaSnapshot;

/// One DDL statement of a table swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapStep {
    RenameTable { from: String, to: String },
    DropIndex { name: String },
    CreateTable { name: String, sql: String },
    CreateIndex { name: String, sql: String },
}

impl SwapStep {
    /// SQL text submitted to the engine
    pub fn sql(&self) -> String {
        match self {
            SwapStep::RenameTable { from, to } => format!("ALTER TABLE {} RENAME TO {}", from, to),
            SwapStep::DropIndex { name } => format!("DROP INDEX IF EXISTS {}", name),
            SwapStep::CreateTable { sql, .. } | SwapStep::CreateIndex { sql, .. } => sql.clone(),
        }
    }
}

/// Ordered swap steps plus the rename mapping kept for operator recovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSwapPlan {
    pub steps: Vec<SwapStep>,
    /// (original, renamed) pairs
    pub renamed_tables: Vec<(String, String)>,
}

impl TableSwapPlan {
    pub fn statements(&self) -> Vec<String> {
        self.steps.iter().map(SwapStep::sql).collect()
    }
}

/// Name a table is moved to during a swap
pub fn renamed_table_name(table: &str, timestamp: i64) -> String {
    format!("{}_{}", table, timestamp)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(name: &str) -> Result<(), VgError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(VgError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// Plan the swap for a captured schema
///
/// `timestamp` is the unix time used as the rename suffix. Tables absent
/// from the snapshot are neither renamed nor recreated.
pub fn plan_table_swap(
    snapshot: &SchemaSnapshot,
    timestamp: i64,
) -> Result<TableSwapPlan, VgError> {
    for name in snapshot.tables.keys().chain(snapshot.indices.keys()) {
        check_identifier(name)?;
    }

    let mut steps = Vec::with_capacity(2 * (snapshot.tables.len() + snapshot.indices.len()));
    let mut renamed_tables = Vec::with_capacity(snapshot.tables.len());

    for table in snapshot.tables.keys() {
        let to = renamed_table_name(table, timestamp);
        renamed_tables.push((table.clone(), to.clone()));
        steps.push(SwapStep::RenameTable {
            from: table.clone(),
            to,
        });
    }

    for index in snapshot.indices.keys() {
        steps.push(SwapStep::DropIndex {
            name: index.clone(),
        });
    }

    for (table, sql) in &snapshot.tables {
        steps.push(SwapStep::CreateTable {
            name: table.clone(),
            sql: sql.clone(),
        });
    }

    for (index, sql) in &snapshot.indices {
        steps.push(SwapStep::CreateIndex {
            name: index.clone(),
            sql: sql.clone(),
        });
    }

    Ok(TableSwapPlan {
        steps,
        renamed_tables,
    })
}
