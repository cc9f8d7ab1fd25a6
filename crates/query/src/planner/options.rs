//! Find request options.

use crate::ast::{SortOrder, WhereNode};
use crate::eval::Predicate;
use tally_core::{Row, Value};
use tally_index::KeyRange;

/// Requested result order.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub order: SortOrder,
}

impl OrderBy {
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Desc)
    }
}

/// A key range on one column.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeFilter {
    pub column: String,
    pub range: KeyRange<Value>,
}

impl RangeFilter {
    pub fn new(column: impl Into<String>, range: KeyRange<Value>) -> Self {
        Self {
            column: column.into(),
            range,
        }
    }

    /// Returns true if the row's value lies inside the range. Null only lies
    /// inside the unbounded range.
    pub fn accepts(&self, row: &Row) -> bool {
        let value = row.value(&self.column);
        if value.is_null() {
            return self.range.is_all();
        }
        self.range.contains(value)
    }
}

impl Predicate for RangeFilter {
    fn eval(&self, row: &Row) -> bool {
        self.accepts(row)
    }
}

/// Options of a `find` request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    pub filter: Option<WhereNode>,
    pub order_by: Option<OrderBy>,
    pub range: Option<RangeFilter>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: WhereNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some(OrderBy::new(column, order));
        self
    }

    pub fn range(mut self, column: impl Into<String>, range: KeyRange<Value>) -> Self {
        self.range = Some(RangeFilter::new(column, range));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Number of matching rows a scan must collect before offset and limit
    /// are applied, if bounded.
    pub fn wanted(&self) -> Option<usize> {
        self.limit.map(|l| l.saturating_add(self.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_filter_accepts() {
        let f = RangeFilter::new("age", KeyRange::bound(Value::Int64(10), Value::Int64(20), false, true));
        assert!(f.accepts(&Row::new().with("age", 10)));
        assert!(f.accepts(&Row::new().with("age", 15.5)));
        assert!(!f.accepts(&Row::new().with("age", 20)));
        assert!(!f.accepts(&Row::new()));

        let upper = RangeFilter::new("age", KeyRange::upper_bound(Value::Int64(5), false));
        assert!(!upper.accepts(&Row::new().with("age", Value::Null)));
        assert!(RangeFilter::new("age", KeyRange::all()).accepts(&Row::new()));
    }

    #[test]
    fn test_wanted() {
        assert_eq!(FindOptions::new().wanted(), None);
        assert_eq!(FindOptions::new().limit(5).offset(3).wanted(), Some(8));
        assert_eq!(FindOptions::new().limit(usize::MAX).offset(3).wanted(), Some(usize::MAX));
    }
}
