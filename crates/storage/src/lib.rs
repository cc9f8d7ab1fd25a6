//! Tally Storage - Storage layer for the Tally data engine.
//!
//! This crate provides the storage layer including:
//!
//! - `IndexedTable`: Row storage with sorted index maintenance
//! - `Cursor`: Index walk with deferred updates and deletes
//! - `TableCache`: Multi-table cache management
//! - `Snapshot`: Rollback state captured before the first write
//! - `Transaction`: Transaction scope, mode and rollback support
//!
//! # Example
//!
//! ```rust
//! use tally_core::schema::{column, TableBuilder};
//! use tally_core::Row;
//! use tally_storage::{Scope, TableCache, Transaction, TransactionMode};
//!
//! let mut cache = TableCache::new();
//! let schema = TableBuilder::new("users")
//!     .column(column("id").int64().primary_key())
//!     .column(column("name").string().indexed())
//!     .build()
//!     .unwrap();
//! cache.create_table(schema).unwrap();
//!
//! let mut tx = Transaction::begin(&cache, TransactionMode::ReadWrite, Scope::All);
//! let users = tx.write(&cache, "users").unwrap();
//! users.borrow_mut().insert(Row::new().with("id", 1).with("name", "Alice")).unwrap();
//! tx.commit().unwrap();
//!
//! assert_eq!(cache.table("users").unwrap().borrow().len(), 1);
//! ```

pub mod cache;
pub mod cursor;
pub mod snapshot;
pub mod table;
pub mod transaction;

pub use cache::TableCache;
pub use cursor::{Cursor, IndexUpdate};
pub use snapshot::Snapshot;
pub use table::{ColumnIndex, IndexedTable, SharedTable};
pub use transaction::{Changes, Scope, Transaction, TransactionId, TransactionMode, TransactionState};
