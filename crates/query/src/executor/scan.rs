//! Index scan executor.

use crate::ast::WhereNode;
use crate::eval::Predicate;
use crate::planner::QueryPlan;
use std::rc::Rc;
use tally_core::{Result, Row};
use tally_storage::{Cursor, SharedTable};

/// Walks the index a plan selected with a cursor, keeping the rows that pass
/// the plan's ranges and the filter.
pub struct IndexScanExecutor<'a> {
    table: &'a SharedTable,
    plan: &'a QueryPlan,
}

impl<'a> IndexScanExecutor<'a> {
    pub fn new(table: &'a SharedTable, plan: &'a QueryPlan) -> Self {
        Self { table, plan }
    }

    fn open(&self) -> Result<Cursor> {
        let range = self.plan.scan_range.as_ref().map(|r| r.range.clone());
        self.table
            .create_cursor(self.plan.index(), self.plan.direction, range)
    }

    fn accepts(&self, filter: Option<&WhereNode>, row: &Row) -> bool {
        self.plan.scan_range.as_ref().map_or(true, |r| r.accepts(row))
            && self.plan.residual_range.as_ref().map_or(true, |r| r.accepts(row))
            && filter.eval(row)
    }

    /// Collects matching rows in scan order, stopping once `wanted` rows were
    /// found.
    pub fn execute(&self, filter: Option<&WhereNode>, wanted: Option<usize>) -> Result<Vec<Rc<Row>>> {
        let mut cursor = self.open()?;
        let mut out = Vec::new();
        while let Some(row) = cursor.value() {
            if wanted.map_or(false, |w| out.len() >= w) {
                break;
            }
            if self.accepts(filter, &row) {
                out.push(row);
            }
            cursor.advance();
        }
        cursor.close()?;
        Ok(out)
    }

    /// Counts matching rows without collecting them.
    pub fn count(&self, filter: Option<&WhereNode>) -> Result<usize> {
        let mut cursor = self.open()?;
        let mut count = 0;
        while let Some(row) = cursor.value() {
            if self.accepts(filter, &row) {
                count += 1;
            }
            cursor.advance();
        }
        cursor.close()?;
        Ok(count)
    }
}
