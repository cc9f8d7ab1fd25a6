//! AST module for where trees and sort orders.

mod builder;
mod node;

pub use builder::{and_all, col, or_all, ColumnScope};
pub use node::{BooleanGroup, Condition, LogicalOp, Operator, SortOrder, WhereNode};
