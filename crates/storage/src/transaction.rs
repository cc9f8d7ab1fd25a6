//! Transaction management for the Tally engine.
//!
//! This module provides the storage half of a transaction: its scope and mode,
//! the lazily captured rollback [`Snapshot`], and the set of tables it wrote.

use crate::cache::TableCache;
use crate::snapshot::Snapshot;
use crate::table::SharedTable;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tally_core::schema::{AlterTableAction, TableSchema};
use tally_core::{Error, Result};

/// Global transaction ID counter.
static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction ID type.
pub type TransactionId = u64;

/// Access mode of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
    /// Opened by a migration; may create, drop and alter tables.
    VersionChange,
}

/// Transaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// Tables a transaction may touch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    All,
    Tables(BTreeSet<String>),
}

impl Scope {
    pub fn tables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scope::Tables(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Tables(names) => names.contains(name),
        }
    }
}

/// What a committed transaction changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Changes {
    /// Tables whose rows or schema were written.
    pub tables: BTreeSet<String>,
    /// True when tables were created, dropped, renamed or altered.
    pub schema_changed: bool,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && !self.schema_changed
    }
}

/// A storage transaction over one [`TableCache`].
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    mode: TransactionMode,
    scope: Scope,
    state: TransactionState,
    snapshot: Snapshot,
    changes: Changes,
}

impl Transaction {
    /// Starts a transaction. Version-change transactions capture the whole
    /// table set up front; the others capture each table before its first write.
    pub fn begin(cache: &TableCache, mode: TransactionMode, scope: Scope) -> Self {
        let (scope, snapshot) = match mode {
            TransactionMode::VersionChange => (Scope::All, Snapshot::of_cache(cache)),
            _ => (scope, Snapshot::Empty),
        };
        Self {
            id: NEXT_TX_ID.fetch_add(1, Ordering::SeqCst),
            mode,
            scope,
            state: TransactionState::Active,
            snapshot,
            changes: Changes::default(),
        }
    }

    /// Returns the transaction ID.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the current state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true if the transaction is active.
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Returns the changes recorded so far.
    pub fn changes(&self) -> &Changes {
        &self.changes
    }

    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::TransactionClosed);
        }
        Ok(())
    }

    fn check_scope(&self, name: &str) -> Result<()> {
        if !self.scope.contains(name) {
            return Err(Error::TableNotInScope {
                table: name.to_string(),
            });
        }
        Ok(())
    }

    fn check_version_change(&self, operation: &str) -> Result<()> {
        if self.mode != TransactionMode::VersionChange {
            return Err(Error::invalid_operation(format!(
                "{} is only allowed while upgrading",
                operation
            )));
        }
        Ok(())
    }

    /// Gets a table for reading.
    pub fn read(&self, cache: &TableCache, name: &str) -> Result<SharedTable> {
        self.check_active()?;
        self.check_scope(name)?;
        cache.table(name)
    }

    /// Gets a table for writing, capturing its rollback state first.
    pub fn write(&mut self, cache: &TableCache, name: &str) -> Result<SharedTable> {
        self.check_active()?;
        self.check_scope(name)?;
        if self.mode == TransactionMode::ReadOnly {
            return Err(Error::ReadOnlyTransaction {
                table: name.to_string(),
            });
        }
        let table = cache.table(name)?;
        self.snapshot.capture_table(cache, name);
        self.changes.tables.insert(name.to_string());
        Ok(table)
    }

    /// Creates a table.
    pub fn create_table(&mut self, cache: &mut TableCache, schema: TableSchema) -> Result<SharedTable> {
        self.check_active()?;
        self.check_version_change("create_table")?;
        let name = schema.name().to_string();
        let table = cache.create_table(schema)?;
        self.changes.tables.insert(name);
        self.changes.schema_changed = true;
        Ok(table)
    }

    /// Drops a table.
    pub fn drop_table(&mut self, cache: &mut TableCache, name: &str) -> Result<()> {
        self.check_active()?;
        self.check_version_change("drop_table")?;
        cache.drop_table(name)?;
        self.changes.tables.remove(name);
        self.changes.schema_changed = true;
        Ok(())
    }

    /// Replays alteration actions onto a table, in order.
    pub fn alter_table(
        &mut self,
        cache: &mut TableCache,
        name: &str,
        actions: &[AlterTableAction],
    ) -> Result<()> {
        self.check_active()?;
        self.check_version_change("alter_table")?;
        let mut current = name.to_string();
        for action in actions {
            match action {
                AlterTableAction::RenameTable { to } => {
                    cache.rename_table(&current, to)?;
                    self.changes.tables.remove(&current);
                    current = to.clone();
                }
                _ => cache.table(&current)?.borrow_mut().apply_alter(action)?,
            }
            self.changes.tables.insert(current.clone());
        }
        self.changes.schema_changed = true;
        Ok(())
    }

    /// Marks the current state as the new rollback point. Only used between
    /// migration steps.
    pub fn savepoint(&mut self, cache: &TableCache) -> Result<()> {
        self.check_active()?;
        self.check_version_change("savepoint")?;
        self.snapshot = Snapshot::of_cache(cache);
        Ok(())
    }

    /// Fails with `TableLocked` while a cursor still holds a table this
    /// transaction wrote.
    pub fn check_unlocked(&self, cache: &TableCache) -> Result<()> {
        for name in &self.changes.tables {
            if cache.get_table(name).map_or(false, |t| t.borrow().is_locked()) {
                return Err(Error::table_locked(name.clone()));
            }
        }
        Ok(())
    }

    /// Commits the transaction, returning what it changed.
    pub fn commit(mut self) -> Result<Changes> {
        self.check_active()?;
        self.state = TransactionState::Committed;
        Ok(std::mem::take(&mut self.changes))
    }

    /// Rolls back the transaction, restoring every captured table.
    pub fn rollback(mut self, cache: &mut TableCache) -> Result<()> {
        self.check_active()?;
        self.state = TransactionState::RolledBack;
        std::mem::take(&mut self.snapshot).restore(cache);
        Ok(())
    }
}
