//! Cache management for the Tally engine.
//!
//! This module provides the `TableCache` struct which owns every table of one
//! database. Tables are handed out as [`SharedTable`] handles so that table API
//! objects, cursors and transactions all see the same storage.

use crate::table::{IndexedTable, SharedTable};
use std::collections::BTreeMap;
use tally_core::schema::TableSchema;
use tally_core::{Error, Result};

/// Cache for managing the tables of one database.
#[derive(Debug, Default)]
pub struct TableCache {
    /// Table name → shared table.
    tables: BTreeMap<String, SharedTable>,
}

impl TableCache {
    /// Creates a new empty table cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table in the cache.
    pub fn create_table(&mut self, schema: TableSchema) -> Result<SharedTable> {
        self.insert_table(IndexedTable::new(schema))
    }

    /// Adds an already populated table, e.g. one restored from disk.
    pub fn insert_table(&mut self, table: IndexedTable) -> Result<SharedTable> {
        let name = table.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(Error::TableAlreadyExists { name });
        }
        let shared = SharedTable::new(table);
        self.tables.insert(name, shared.clone());
        Ok(shared)
    }

    /// Drops a table from the cache.
    pub fn drop_table(&mut self, name: &str) -> Result<SharedTable> {
        let table = self.table(name)?;
        if table.borrow().is_locked() {
            return Err(Error::table_locked(name));
        }
        self.tables.remove(name);
        Ok(table)
    }

    /// Renames a table, keeping its handle valid.
    pub fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        if self.tables.contains_key(to) {
            return Err(Error::TableAlreadyExists { name: to.to_string() });
        }
        let table = self.table(from)?;
        table.borrow_mut().rename(to)?;
        self.tables.remove(from);
        self.tables.insert(to.to_string(), table);
        Ok(())
    }

    /// Gets a handle to a table.
    pub fn get_table(&self, name: &str) -> Option<SharedTable> {
        self.tables.get(name).cloned()
    }

    /// Gets a handle to a table or fails with `TableNotFound`.
    pub fn table(&self, name: &str) -> Result<SharedTable> {
        self.get_table(name).ok_or_else(|| Error::table_not_found(name))
    }

    /// Checks if a table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Returns the number of tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Returns all table names in sorted order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Returns the schema of every table, in name order.
    pub fn schemas(&self) -> Vec<TableSchema> {
        self.tables
            .values()
            .map(|t| t.borrow().schema().clone())
            .collect()
    }

    /// Returns the total row count across all tables.
    pub fn total_row_count(&self) -> usize {
        self.tables.values().map(|t| t.borrow().len()).sum()
    }

    /// Captures the contents of every table. Rows are shared, not copied.
    pub fn capture(&self) -> BTreeMap<String, IndexedTable> {
        self.tables
            .iter()
            .map(|(name, t)| (name.clone(), t.borrow().clone()))
            .collect()
    }

    /// Puts the cache back to a captured state.
    ///
    /// Tables present in both keep their handle and get their contents
    /// replaced; tables created since the capture are removed and dropped
    /// tables come back.
    pub fn restore(&mut self, captured: BTreeMap<String, IndexedTable>) {
        self.tables.retain(|name, _| captured.contains_key(name));
        for (name, table) in captured {
            match self.tables.get(&name) {
                Some(shared) => {
                    shared.replace(table);
                }
                None => {
                    self.tables.insert(name, SharedTable::new(table));
                }
            }
        }
    }

    /// Removes every table.
    pub fn clear(&mut self) {
        self.tables.clear();
    }
}
