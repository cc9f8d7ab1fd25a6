//! Database - Main entry point for Tally database operations.
//!
//! A [`Database`] drives one adapter: it opens a named database at a schema
//! version (running migrations as needed) and scopes every read and write to a
//! transaction.

use crate::adapter::{DatabaseAdapter, DatabaseInfo, DatabaseState};
use crate::migration::run_migrations;
use crate::transaction::Transaction;
use tally_core::{Error, Result};
use tally_storage::TransactionMode;
use tracing::warn;

/// The main database interface.
#[derive(Debug)]
pub struct Database<A: DatabaseAdapter> {
    adapter: A,
    name: Option<String>,
}

impl<A: DatabaseAdapter> Database<A> {
    pub fn new(adapter: A) -> Self {
        Self { adapter, name: None }
    }

    #[inline]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Name of the open database.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn state(&self) -> DatabaseState {
        self.adapter.state()
    }

    pub fn is_open(&self) -> bool {
        self.state() == DatabaseState::Open
    }

    /// Opens `name` at `version`, closing any database opened before.
    ///
    /// When the stored version is lower, `upgrade(tx, new, old)` runs once per
    /// step inside a single version-change transaction. A failed step leaves
    /// the database at the last completed step and closed.
    pub fn open<F>(&mut self, name: &str, version: u32, upgrade: F) -> Result<()>
    where
        F: FnMut(&Transaction<'_>, u32, u32) -> Result<()>,
    {
        if self.name.is_some() {
            self.close()?;
        }
        let stored = self
            .adapter
            .database_info(name)?
            .map_or(0, |info| info.version);

        let opened = match self.adapter.open_database(name, version)? {
            Some(tx) => run_migrations(tx, stored, version, upgrade),
            None => Ok(()),
        };
        if let Err(err) = opened {
            if let Err(close) = self.adapter.close_database() {
                warn!(database = name, error = %close, "closing after a failed open failed");
            }
            return Err(err);
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.adapter.close_database()?;
        self.name = None;
        Ok(())
    }

    /// Deletes `name`, closing it first if it is the open database.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.adapter.delete_database(name)?;
        if self.name.as_deref() == Some(name) {
            self.name = None;
        }
        Ok(())
    }

    /// Info of the open database.
    pub fn info(&self) -> Result<DatabaseInfo> {
        let name = self.name.as_deref().ok_or(Error::DatabaseNotOpen)?;
        self.adapter
            .database_info(name)?
            .ok_or(Error::DatabaseNotOpen)
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        self.adapter.table_names()
    }

    pub fn table_index_names(&self, table: &str) -> Result<Vec<String>> {
        self.adapter.table_index_names(table)
    }

    /// Starts a transaction over `tables`; an empty list covers every table.
    /// The caller commits or rolls it back.
    pub fn transaction(&self, tables: &[&str], mode: TransactionMode) -> Result<Transaction<'_>> {
        self.adapter.open_transaction(tables, mode)
    }

    /// Runs `block` in a transaction, committing when it returns `Ok` and
    /// rolling back when it returns `Err`.
    pub fn with_transaction<T, F>(&self, tables: &[&str], mode: TransactionMode, block: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self.transaction(tables, mode)?;
        match block(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    warn!(error = %rollback, "rollback after a failed block failed");
                }
                Err(err)
            }
        }
    }
}
