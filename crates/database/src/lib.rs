//! Tally Database - Versioned transactional database API.
//!
//! This crate ties the Tally layers together behind a [`Database`]:
//!
//! - `Database`: opens a named database at a schema version and runs migrations
//! - `Transaction`: scoped, read-only or read-write unit of work
//! - `Table`: find, count, insert, update, delete and join on one table
//! - `MemoryAdapter` / `FilesystemAdapter`: where databases live
//!
//! # Example
//!
//! ```rust
//! use tally_core::schema::{column, TableBuilder};
//! use tally_core::Row;
//! use tally_database::{Database, MemoryAdapter, TransactionMode};
//! use tally_query::ast::col;
//!
//! let mut db = Database::new(MemoryAdapter::new());
//! db.open("app", 1, |tx, _new, _old| {
//!     let schema = TableBuilder::new("users")
//!         .column(column("id").int64().primary_key())
//!         .column(column("age").int64().indexed())
//!         .build()?;
//!     tx.create_table(schema)?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! db.with_transaction(&["users"], TransactionMode::ReadWrite, |tx| {
//!     let users = tx.table("users")?;
//!     users.insert(Row::new().with("id", 1).with("age", 30))?;
//!     users.insert(Row::new().with("id", 2).with("age", 17))?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! let adults = db
//!     .with_transaction(&["users"], TransactionMode::ReadOnly, |tx| {
//!         tx.table("users")?.count(Some(&col("age").gte(18)))
//!     })
//!     .unwrap();
//! assert_eq!(adults, 1);
//! ```

pub mod adapter;
pub mod config;
pub mod convert;
pub mod database;
mod engine;
pub mod filesystem;
pub mod memory;
pub mod migration;
pub mod table;
pub mod transaction;

pub use adapter::{DatabaseAdapter, DatabaseInfo, DatabaseState};
pub use config::FilesystemConfig;
pub use convert::{json_to_row, json_to_value, row_to_json, value_to_json};
pub use database::Database;
pub use filesystem::FilesystemAdapter;
pub use memory::MemoryAdapter;
pub use table::{JoinedTable, Table, TableCursor};
pub use transaction::Transaction;

pub use tally_core::{DataType, Error, Result, Row, Value};
pub use tally_storage::TransactionMode;
