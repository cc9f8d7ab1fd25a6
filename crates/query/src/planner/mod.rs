//! Query planning.
//!
//! The planner picks the index a cursor walks for a [`FindOptions`] request
//! and decides whether the matched rows still need a manual sort. The filter
//! never influences the choice; it is applied to rows during the scan.

mod options;
mod plan;

pub use options::{FindOptions, OrderBy, RangeFilter};
pub use plan::{plan, QueryPlan};
