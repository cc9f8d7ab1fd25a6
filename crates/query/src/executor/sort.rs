//! Sort executor.

use crate::ast::SortOrder;
use crate::planner::OrderBy;
use core::cmp::Ordering;
use std::rc::Rc;
use tally_core::Row;

/// Sort executor - stable sort of rows by column values.
///
/// Values use their total order, so `Null` comes first ascending and last
/// descending.
pub struct SortExecutor {
    order_by: Vec<OrderBy>,
}

impl SortExecutor {
    /// Creates a new sort executor.
    pub fn new(order_by: Vec<OrderBy>) -> Self {
        Self { order_by }
    }

    /// Executes the sort on the input rows.
    pub fn execute(&self, mut input: Vec<Rc<Row>>) -> Vec<Rc<Row>> {
        input.sort_by(|a, b| self.compare_rows(a, b));
        input
    }

    fn compare_rows(&self, a: &Row, b: &Row) -> Ordering {
        for OrderBy { column, order } in &self.order_by {
            let cmp = a.value(column).cmp(b.value(column));
            if cmp != Ordering::Equal {
                return match order {
                    SortOrder::Asc => cmp,
                    SortOrder::Desc => cmp.reverse(),
                };
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::Value;

    fn row(id: i64, name: &str, score: Option<i64>) -> Rc<Row> {
        Rc::new(Row::new().with("id", id).with("name", name).with("score", score))
    }

    fn ids(rows: &[Rc<Row>]) -> Vec<i64> {
        rows.iter().filter_map(|r| r.value("id").as_i64()).collect()
    }

    #[test]
    fn test_sort_executor_asc() {
        let rows = vec![row(1, "c", Some(30)), row(2, "a", Some(10)), row(3, "b", Some(20))];
        let result = SortExecutor::new(vec![OrderBy::asc("score")]).execute(rows);
        assert_eq!(ids(&result), vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_executor_desc_with_nulls() {
        let rows = vec![row(1, "a", None), row(2, "b", Some(10)), row(3, "c", Some(20))];
        let result = SortExecutor::new(vec![OrderBy::desc("score")]).execute(rows);
        assert_eq!(ids(&result), vec![3, 2, 1]);
        assert_eq!(result[2].value("score"), &Value::Null);
    }

    #[test]
    fn test_sort_is_stable() {
        let rows = vec![row(1, "x", Some(1)), row(2, "y", Some(1)), row(3, "z", Some(0))];
        let result = SortExecutor::new(vec![OrderBy::desc("score")]).execute(rows);
        assert_eq!(ids(&result), vec![1, 2, 3]);
    }

    #[test]
    fn test_multi_column_sort() {
        let rows = vec![row(1, "b", Some(1)), row(2, "a", Some(1)), row(3, "c", Some(0))];
        let result = SortExecutor::new(vec![OrderBy::asc("score"), OrderBy::asc("name")]).execute(rows);
        assert_eq!(ids(&result), vec![3, 2, 1]);
    }
}
