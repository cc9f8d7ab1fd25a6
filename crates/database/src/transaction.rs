//! Database transactions.
//!
//! A [`Transaction`] wraps the storage transaction of the open database. It is
//! committed or rolled back exactly once; dropping one that is still active
//! rolls it back.

use crate::engine::{Engine, Session};
use crate::table::Table;
use std::cell::{Cell, RefCell};
use tally_core::schema::{AlterTableAction, AlterTableBuilder, TableSchema};
use tally_core::{Error, Result};
use tally_storage::{SharedTable, Transaction as StorageTransaction, TransactionId, TransactionMode};
use tracing::{debug, error, warn};

/// Table name taken by the stored metadata of a database.
pub(crate) const RESERVED_TABLE_NAME: &str = "meta";

fn check_not_reserved(table: &str) -> Result<()> {
    if table == RESERVED_TABLE_NAME {
        return Err(Error::invalid_schema(format!("Table name {} is reserved", table)));
    }
    Ok(())
}

pub struct Transaction<'a> {
    engine: &'a Engine,
    inner: RefCell<Option<StorageTransaction>>,
    mode: TransactionMode,
    target_version: Option<u32>,
    checkpointed: Cell<bool>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(
        engine: &'a Engine,
        inner: StorageTransaction,
        target_version: Option<u32>,
    ) -> Self {
        Self {
            engine,
            mode: inner.mode(),
            inner: RefCell::new(Some(inner)),
            target_version,
            checkpointed: Cell::new(false),
        }
    }

    #[inline]
    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub fn id(&self) -> Option<TransactionId> {
        self.inner.borrow().as_ref().map(|tx| tx.id())
    }

    pub fn is_active(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// Version the database will have once this migration commits.
    pub fn target_version(&self) -> Option<u32> {
        self.target_version
    }

    fn with_inner<R>(
        &self,
        f: impl FnOnce(&mut StorageTransaction, &mut Session) -> Result<R>,
    ) -> Result<R> {
        let mut inner = self.inner.borrow_mut();
        let tx = inner.as_mut().ok_or(Error::TransactionClosed)?;
        self.engine.with_session(|session| f(tx, session))
    }

    pub(crate) fn read_table(&self, name: &str) -> Result<SharedTable> {
        self.with_inner(|tx, session| tx.read(&session.cache, name))
    }

    pub(crate) fn write_table(&self, name: &str) -> Result<SharedTable> {
        self.with_inner(|tx, session| tx.write(&session.cache, name))
    }

    /// Returns a handle on a table in this transaction's scope.
    pub fn table(&self, name: &str) -> Result<Table<'_>> {
        self.read_table(name)?;
        Ok(Table::new(self, name))
    }

    /// Creates a table. Only allowed while upgrading.
    pub fn create_table(&self, schema: TableSchema) -> Result<Table<'_>> {
        let name = schema.name().to_string();
        check_not_reserved(&name)?;
        self.with_inner(|tx, session| tx.create_table(&mut session.cache, schema))?;
        Ok(Table::new(self, &name))
    }

    /// Drops a table. Only allowed while upgrading.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.with_inner(|tx, session| tx.drop_table(&mut session.cache, name))
    }

    /// Applies the builder's actions to its table, in order. Only allowed
    /// while upgrading.
    pub fn alter_table(&self, builder: AlterTableBuilder) -> Result<()> {
        self.alter(builder.table(), builder.actions())
    }

    pub(crate) fn alter(&self, table: &str, actions: &[AlterTableAction]) -> Result<()> {
        for action in actions {
            if let AlterTableAction::RenameTable { to } = action {
                check_not_reserved(to)?;
            }
        }
        self.with_inner(|tx, session| tx.alter_table(&mut session.cache, table, actions))
    }

    /// Marks the end of one migration step: the current tables become the
    /// rollback point and the database is now at `version`.
    pub(crate) fn checkpoint(&self, version: u32) -> Result<()> {
        self.with_inner(|tx, session| {
            tx.savepoint(&session.cache)?;
            session.info.version = version;
            Ok(())
        })?;
        self.checkpointed.set(true);
        Ok(())
    }

    fn take_inner(&self) -> Result<StorageTransaction> {
        self.inner.borrow_mut().take().ok_or(Error::TransactionClosed)
    }

    fn restore(&self, inner: StorageTransaction) -> Result<()> {
        self.engine
            .with_session(|session| inner.rollback(&mut session.cache))
    }

    /// Makes the transaction's writes durable. When persisting fails, or a
    /// cursor still holds one of the written tables, the in-memory state is
    /// rolled back and the error returned.
    pub fn commit(self) -> Result<()> {
        let inner = self.take_inner()?;
        let result = self.finish_commit(inner);
        self.engine
            .finish_transaction(result.is_ok() && self.target_version.is_some());
        result
    }

    fn finish_commit(&self, inner: StorageTransaction) -> Result<()> {
        let id = inner.id();
        if let Err(err) = self
            .engine
            .with_session(|session| inner.check_unlocked(&session.cache))
        {
            warn!(id, error = %err, "commit while a cursor is open, rolling back");
            self.restore(inner)?;
            return Err(err);
        }
        let (changes, previous) = match self.target_version {
            Some(version) => self.engine.with_session(|session| {
                let previous = session.info.version;
                session.info.version = version;
                Ok((session.all_changes(), Some(previous)))
            })?,
            None => (inner.changes().clone(), None),
        };

        if !changes.is_empty() {
            if let Err(err) = self.engine.persist(&changes) {
                error!(id, error = %err, "persisting commit failed, rolling back");
                if let Some(previous) = previous {
                    self.engine.with_session(|session| {
                        session.info.version = previous;
                        Ok(())
                    })?;
                }
                self.restore(inner)?;
                return Err(err);
            }
        }
        inner.commit()?;
        debug!(
            id,
            tables = changes.tables.len(),
            schema_changed = changes.schema_changed,
            "transaction committed"
        );
        Ok(())
    }

    /// Discards the transaction's writes, including those of a cursor that
    /// was never closed.
    pub fn rollback(self) -> Result<()> {
        let inner = self.take_inner()?;
        let id = inner.id();
        let result = self.restore(inner);
        self.engine.finish_transaction(false);
        debug!(id, "transaction rolled back");
        result
    }

    /// Ends a failed migration: the tables go back to the last checkpoint and,
    /// if any step completed, that state is persisted.
    pub(crate) fn abort_to_checkpoint(self) -> Result<()> {
        let inner = self.take_inner()?;
        let mut result = self.restore(inner);
        if result.is_ok() && self.checkpointed.get() {
            result = self
                .engine
                .with_session(|session| Ok(session.all_changes()))
                .and_then(|changes| self.engine.persist(&changes));
        }
        self.engine.finish_transaction(false);
        result
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.get_mut().take() {
            warn!(id = inner.id(), "transaction dropped while active, rolling back");
            if let Err(err) = self.restore(inner) {
                error!(error = %err, "rollback of dropped transaction failed");
            }
            self.engine.finish_transaction(false);
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id())
            .field("mode", &self.mode)
            .field("target_version", &self.target_version)
            .finish()
    }
}
