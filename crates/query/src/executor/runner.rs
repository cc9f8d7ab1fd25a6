//! Find and count entry points.

use super::{FilterExecutor, IndexScanExecutor, LimitExecutor, SortExecutor};
use crate::ast::WhereNode;
use crate::context::TablePlanContext;
use crate::planner::{plan, FindOptions, QueryPlan};
use std::rc::Rc;
use tally_core::{Result, Row};
use tally_storage::SharedTable;

/// Plans and runs a find request against a table.
pub fn find(table: &SharedTable, options: &FindOptions) -> Result<Vec<Rc<Row>>> {
    let ctx = TablePlanContext::from_table(&table.borrow());
    let plan = plan(&ctx, options)?;
    execute(table, &plan, options)
}

/// Runs a find request with an existing plan.
///
/// Without a manual sort the scan already yields rows in the requested order,
/// so it stops after `offset + limit` matches.
pub fn execute(table: &SharedTable, plan: &QueryPlan, options: &FindOptions) -> Result<Vec<Rc<Row>>> {
    let wanted = if plan.requires_manual_sort() {
        None
    } else {
        options.wanted()
    };
    let mut rows = IndexScanExecutor::new(table, plan).execute(options.filter.as_ref(), wanted)?;
    if let Some(sort) = &plan.sort {
        rows = SortExecutor::new(vec![sort.clone()]).execute(rows);
    }
    Ok(LimitExecutor::new(options.limit, options.offset).execute(rows))
}

/// Counts the rows matching `filter`.
pub fn count(table: &SharedTable, filter: Option<&WhereNode>) -> Result<usize> {
    let ctx = TablePlanContext::from_table(&table.borrow());
    let plan = plan(&ctx, &FindOptions::new())?;
    IndexScanExecutor::new(table, &plan).count(filter)
}

/// Runs a find request over already materialized rows, e.g. the output of a
/// join. The rows are filtered, sorted when `order_by` is set, then paged.
pub fn find_in(rows: Vec<Rc<Row>>, options: &FindOptions) -> Vec<Rc<Row>> {
    let mut rows = FilterExecutor::new(&options.filter).execute(rows);
    if let Some(range) = &options.range {
        rows = FilterExecutor::new(range).execute(rows);
    }
    if let Some(order_by) = &options.order_by {
        rows = SortExecutor::new(vec![order_by.clone()]).execute(rows);
    }
    LimitExecutor::new(options.limit, options.offset).execute(rows)
}
