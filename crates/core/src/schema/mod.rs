//! Schema module for the Tally data engine.
//!
//! This module contains column and table definitions, the fluent builders that
//! produce them, and the alteration actions replayed by migrations.

mod alter;
mod column;
mod table;

pub use alter::{AlterColumn, AlterTableAction, AlterTableBuilder, ColumnChange};
pub use column::{column, ColumnBuilder, ColumnDefinition};
pub use table::{check_naming_rules, TableBuilder, TableSchema};
