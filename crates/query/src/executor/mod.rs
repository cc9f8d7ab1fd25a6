//! Query executor module.
//!
//! Rows flow through the executors as shared `Rc<Row>` handles:
//!
//! ```text
//! IndexScan(filter) -> Sort (if the plan needs it) -> Limit(offset, limit)
//! ```

mod filter;
mod join;
mod limit;
mod mutate;
mod runner;
mod scan;
mod sort;

pub use filter::FilterExecutor;
pub use join::HashJoin;
pub use limit::LimitExecutor;
pub use mutate::{delete_where, update_where};
pub use runner::{count, execute, find, find_in};
pub use scan::IndexScanExecutor;
pub use sort::SortExecutor;
