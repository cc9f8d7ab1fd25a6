//! Limit executor.

use std::rc::Rc;
use tally_core::Row;

/// Limit executor - applies OFFSET then LIMIT.
pub struct LimitExecutor {
    limit: Option<usize>,
    offset: usize,
}

impl LimitExecutor {
    /// Creates a new limit executor. `None` keeps every row after the offset.
    pub fn new(limit: Option<usize>, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Executes the limit on the input rows.
    pub fn execute(&self, mut input: Vec<Rc<Row>>) -> Vec<Rc<Row>> {
        let len = input.len();
        let start = self.offset.min(len);
        let end = match self.limit {
            Some(limit) => start.saturating_add(limit).min(len),
            None => len,
        };
        input.truncate(end);
        if start > 0 {
            input.drain(..start);
        }
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: i64) -> Vec<Rc<Row>> {
        (0..n).map(|i| Rc::new(Row::new().with("id", i))).collect()
    }

    fn ids(rows: &[Rc<Row>]) -> Vec<i64> {
        rows.iter().filter_map(|r| r.value("id").as_i64()).collect()
    }

    #[test]
    fn test_limit_and_offset() {
        assert_eq!(ids(&LimitExecutor::new(Some(2), 1).execute(rows(5))), vec![1, 2]);
        assert_eq!(ids(&LimitExecutor::new(None, 3).execute(rows(5))), vec![3, 4]);
        assert_eq!(ids(&LimitExecutor::new(Some(10), 0).execute(rows(3))), vec![0, 1, 2]);
    }

    #[test]
    fn test_offset_past_end() {
        assert!(LimitExecutor::new(Some(2), 9).execute(rows(5)).is_empty());
        assert!(LimitExecutor::new(Some(0), 0).execute(rows(5)).is_empty());
    }
}
