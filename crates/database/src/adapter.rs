//! The backend contract every adapter satisfies.

use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use tally_core::Result;
use tally_storage::TransactionMode;

/// Name and schema version of a database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub name: String,
    pub version: u32,
}

impl DatabaseInfo {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// Lifecycle of an adapter's open database. An in-flight transaction is
/// reported separately by [`DatabaseAdapter::in_transaction`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DatabaseState {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

/// Operations a storage backend provides to [`crate::Database`].
///
/// Every implementation must behave identically; the conformance suite runs
/// the same scenarios against each one.
pub trait DatabaseAdapter {
    /// Opens `name`. Returns the version-change transaction when the stored
    /// version is below `version`, or `None` when no migration is needed.
    fn open_database(&self, name: &str, version: u32) -> Result<Option<Transaction<'_>>>;

    /// Closes the open database, if any.
    fn close_database(&self) -> Result<()>;

    /// Removes a database and everything stored for it.
    fn delete_database(&self, name: &str) -> Result<()>;

    /// Starts a transaction over `tables` (every table when empty).
    fn open_transaction(&self, tables: &[&str], mode: TransactionMode) -> Result<Transaction<'_>>;

    /// Returns the stored info of `name`, or `None` if it was never created.
    fn database_info(&self, name: &str) -> Result<Option<DatabaseInfo>>;

    /// Returns the table names of the open database, sorted.
    fn table_names(&self) -> Result<Vec<String>>;

    /// Returns the secondary index names of a table, sorted.
    fn table_index_names(&self, table: &str) -> Result<Vec<String>>;

    /// Returns the lifecycle state.
    fn state(&self) -> DatabaseState;

    /// Returns true while a transaction is in flight.
    fn in_transaction(&self) -> bool;
}
