//! Rollback snapshots.
//!
//! A [`Snapshot`] records the state of a table the first time a transaction
//! writes to it. Rows are `Rc` handles, so a capture copies the row map and the
//! index vectors but never the row data itself.

use crate::cache::TableCache;
use crate::table::IndexedTable;
use std::collections::{BTreeMap, BTreeSet};

/// Pre-write state of the tables a transaction touched.
#[derive(Debug, Default)]
pub enum Snapshot {
    /// Nothing captured yet.
    #[default]
    Empty,
    /// Individual tables captured lazily before their first write.
    Tables(BTreeMap<String, IndexedTable>),
    /// The whole table set, including which tables existed.
    Cache(BTreeMap<String, IndexedTable>),
}

impl Snapshot {
    /// Captures every table of `cache`.
    pub fn of_cache(cache: &TableCache) -> Self {
        Snapshot::Cache(cache.capture())
    }

    /// Captures `name` unless it was already captured. A whole-cache snapshot
    /// already covers every table.
    pub fn capture_table(&mut self, cache: &TableCache, name: &str) {
        if let Snapshot::Empty = self {
            *self = Snapshot::Tables(BTreeMap::new());
        }
        if let Snapshot::Tables(tables) = self {
            if tables.contains_key(name) {
                return;
            }
            if let Some(table) = cache.get_table(name) {
                tables.insert(name.to_string(), table.borrow().clone());
            }
        }
    }

    /// Returns the names of the captured tables.
    pub fn captured(&self) -> BTreeSet<String> {
        match self {
            Snapshot::Empty => BTreeSet::new(),
            Snapshot::Tables(tables) | Snapshot::Cache(tables) => tables.keys().cloned().collect(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Snapshot::Empty)
    }

    /// Puts every captured table back into `cache`.
    pub fn restore(self, cache: &mut TableCache) {
        match self {
            Snapshot::Empty => {}
            Snapshot::Tables(tables) => {
                for (name, table) in tables {
                    if let Some(shared) = cache.get_table(&name) {
                        shared.replace(table);
                    }
                }
            }
            Snapshot::Cache(tables) => cache.restore(tables),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::schema::{column, TableBuilder};
    use tally_core::Row;

    fn cache() -> TableCache {
        let mut cache = TableCache::new();
        for name in ["a", "b"] {
            let schema = TableBuilder::new(name)
                .column(column("id").int64().primary_key())
                .build()
                .unwrap();
            cache.create_table(schema).unwrap();
        }
        cache
    }

    #[test]
    fn test_table_snapshot_restores_only_captured_tables() {
        let mut cache = cache();
        let mut snapshot = Snapshot::default();
        assert!(snapshot.is_empty());

        snapshot.capture_table(&cache, "a");
        cache.table("a").unwrap().borrow_mut().insert(Row::new().with("id", 1)).unwrap();
        // A second capture keeps the first state
        snapshot.capture_table(&cache, "a");
        cache.table("b").unwrap().borrow_mut().insert(Row::new().with("id", 1)).unwrap();

        assert_eq!(snapshot.captured().len(), 1);
        snapshot.restore(&mut cache);
        assert_eq!(cache.table("a").unwrap().borrow().len(), 0);
        assert_eq!(cache.table("b").unwrap().borrow().len(), 1);
    }

    #[test]
    fn test_cache_snapshot_restores_table_set() {
        let mut cache = cache();
        let snapshot = Snapshot::of_cache(&cache);
        cache.drop_table("a").unwrap();
        cache.rename_table("b", "c").unwrap();

        snapshot.restore(&mut cache);
        assert_eq!(cache.table_names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.table("b").unwrap().borrow().schema().name(), "b");
    }
}
