//! Per-table-set writer queue.
//!
//! Each distinct set of tables gets one async read/write lock. Backups share
//! it; restore and sync take it exclusively for their whole duration, across
//! every transaction they submit. `tokio::sync::RwLock` is fair, so waiters
//! are served in arrival order and a stream of backups cannot starve a
//! restore.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

/// Lock registry keyed by table set
#[derive(Debug, Default)]
pub struct TableLocks {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock guarding `tables`
    ///
    /// Order and duplicates do not matter: `[a, b]`, `[b, a]` and
    /// `[a, b, a]` share one lock.
    pub fn lock_for(&self, tables: &[&str]) -> Arc<RwLock<()>> {
        let key = table_set_key(tables);
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(key).or_default())
    }

    /// Number of distinct table sets seen so far
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn table_set_key(tables: &[&str]) -> String {
    let mut names: Vec<&str> = tables.to_vec();
    names.sort_unstable();
    names.dedup();
    names.join(",")
}
