use std::collections::BTreeMap;

/// Tables that make up the virtual grant record set
pub const VG_TABLES: [&str; 2] = ["creds_batch", "unblinded_tokens"];

/// Exact creation statements of a table set and its explicit indices
///
/// Implicit auto-indices have no statement in the catalog and are never
/// part of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    /// table name -> CREATE TABLE statement
    pub tables: BTreeMap<String, String>,
    /// index name -> CREATE INDEX statement
    pub indices: BTreeMap<String, String>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.tables.insert(name.into(), sql.into());
        self
    }

    pub fn with_index(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.indices.insert(name.into(), sql.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.indices.is_empty()
    }

    /// Target tables that the catalog did not know about
    pub fn missing_tables<'a>(&self, targets: &[&'a str]) -> Vec<&'a str> {
        targets
            .iter()
            .copied()
            .filter(|t| !self.tables.contains_key(*t))
            .collect()
    }
}
