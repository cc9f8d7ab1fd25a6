//! Tally Core - Core types and schema definitions for the Tally data engine.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - `DataType`: Column types (Boolean, Int64, Float64, String, DateTime, Uuid, Json)
//! - `Value`: Runtime values that can be stored in a row cell
//! - `Row`: An open-ended column name to value mapping
//! - `schema`: Table and column definitions plus alteration actions
//! - `Error`: Error kinds for every engine operation
//!
//! # Example
//!
//! ```rust
//! use tally_core::schema::{column, TableBuilder};
//! use tally_core::{Row, Value};
//!
//! let table = TableBuilder::new("projects")
//!     .column(column("id").int64().primary_key())
//!     .column(column("name").string().unique())
//!     .build()
//!     .unwrap();
//!
//! let row = Row::new().with("id", 1i64).with("name", "Garden");
//!
//! assert_eq!(table.primary_key(), "id");
//! assert_eq!(row.get("name"), Some(&Value::String("Garden".into())));
//! ```

mod error;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use row::Row;
pub use types::DataType;
pub use value::{JsonValue, Value};
