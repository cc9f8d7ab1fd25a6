//! Tally Query - Where builder, planner and executor for the Tally data engine.
//!
//! This crate provides the query layer including:
//!
//! - `ast`: Where trees and their column-scoped builder
//! - `eval`: Where tree evaluation against rows
//! - `context`: Table metadata used for planning
//! - `planner`: Index selection for find requests
//! - `executor`: Scan, filter, sort, limit, mutation and join operators
//!
//! # Example
//!
//! ```rust
//! use tally_core::schema::{column, TableBuilder};
//! use tally_core::Row;
//! use tally_query::ast::{col, SortOrder};
//! use tally_query::executor::find;
//! use tally_query::planner::FindOptions;
//! use tally_storage::{IndexedTable, SharedTable};
//!
//! let schema = TableBuilder::new("persons")
//!     .column(column("id").int64().primary_key())
//!     .column(column("age").int64().indexed())
//!     .build()
//!     .unwrap();
//! let table = SharedTable::new(IndexedTable::new(schema));
//! for (id, age) in [(1, 40), (2, 25), (3, 31)] {
//!     table.borrow_mut().insert(Row::new().with("id", id).with("age", age)).unwrap();
//! }
//!
//! let options = FindOptions::new()
//!     .filter(col("age").gt(26))
//!     .order_by("age", SortOrder::Asc);
//! let rows = find(&table, &options).unwrap();
//! assert_eq!(rows[0].value("id").as_i64(), Some(3));
//! ```

pub mod ast;
pub mod context;
pub mod eval;
pub mod executor;
pub mod planner;
