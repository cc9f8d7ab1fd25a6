//! Index selection.
//!
//! ```text
//! range on indexed column    =>  scan that index, bounded by the range
//! order_by on indexed column =>  scan that index in the requested direction
//! otherwise                  =>  scan the primary key ascending
//!                                (+ manual sort when order_by was requested)
//! ```
//!
//! A scanned range on a column other than `order_by` cannot deliver both
//! orderings from one cursor, so the rows are sorted afterwards.

use super::options::{FindOptions, OrderBy, RangeFilter};
use crate::ast::SortOrder;
use crate::context::TablePlanContext;
use core::fmt;
use tally_core::{Error, Result};
use tally_index::{Direction, KeyRange};

/// How a find request walks its table.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryPlan {
    /// Table the plan was made for.
    pub table: String,
    /// Index to scan; `None` is the primary key.
    pub index: Option<String>,
    /// Whether the scanned secondary index is unique.
    pub unique: bool,
    /// Scan direction.
    pub direction: Direction,
    /// Range bounding the scanned index.
    pub scan_range: Option<RangeFilter>,
    /// Range on an unindexed column, applied as a row filter.
    pub residual_range: Option<RangeFilter>,
    /// Order to restore with a manual sort, when the scan cannot deliver it.
    pub sort: Option<OrderBy>,
}

impl QueryPlan {
    fn primary_key_scan(ctx: &TablePlanContext) -> Self {
        Self {
            table: ctx.table().to_string(),
            index: None,
            unique: false,
            direction: Direction::Next,
            scan_range: None,
            residual_range: None,
            sort: None,
        }
    }

    /// Returns true if matched rows are sorted after the scan.
    #[inline]
    pub fn requires_manual_sort(&self) -> bool {
        self.sort.is_some()
    }

    /// Returns the scanned index column or `None` for the primary key.
    #[inline]
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }
}

fn direction_of(order: SortOrder) -> Direction {
    match order {
        SortOrder::Asc => Direction::Next,
        SortOrder::Desc => Direction::Prev,
    }
}

fn index_name(ctx: &TablePlanContext, column: &str) -> Option<String> {
    if column == ctx.primary_key() {
        None
    } else {
        Some(column.to_string())
    }
}

/// Plans a find request against a table.
///
/// Fails with `ColumnNotFound` when the range or order column is not declared.
pub fn plan(ctx: &TablePlanContext, options: &FindOptions) -> Result<QueryPlan> {
    let named = options
        .range
        .iter()
        .map(|r| r.column.as_str())
        .chain(options.order_by.iter().map(|o| o.column.as_str()));
    for column in named {
        if !ctx.has_column(column) {
            return Err(Error::column_not_found(ctx.table(), column));
        }
    }

    let mut plan = QueryPlan::primary_key_scan(ctx);
    match (&options.range, &options.order_by) {
        (Some(range), order) if ctx.is_scannable(&range.column) => {
            plan.index = index_name(ctx, &range.column);
            plan.unique = ctx.is_unique(&range.column);
            plan.scan_range = Some(range.clone());
            match order {
                Some(order) if order.column == range.column => {
                    plan.direction = direction_of(order.order);
                }
                Some(order) => plan.sort = Some(order.clone()),
                None => {}
            }
        }
        (range, Some(order)) if ctx.is_scannable(&order.column) => {
            plan.index = index_name(ctx, &order.column);
            plan.unique = ctx.is_unique(&order.column);
            plan.direction = direction_of(order.order);
            plan.residual_range = range.clone();
        }
        (range, order) => {
            plan.residual_range = range.clone();
            plan.sort = order.clone();
        }
    }
    Ok(plan)
}

fn write_range(f: &mut fmt::Formatter<'_>, filter: &RangeFilter) -> fmt::Result {
    match &filter.range {
        KeyRange::All => write!(f, "{} any", filter.column),
        KeyRange::Only(v) => write!(f, "{} = {}", filter.column, v),
        range => {
            if let Some((v, exclusive)) = range.lower() {
                write!(f, "{} {} ", v, if exclusive { "<" } else { "<=" })?;
            }
            write!(f, "{}", filter.column)?;
            if let Some((v, exclusive)) = range.upper() {
                write!(f, " {} {}", if exclusive { "<" } else { "<=" }, v)?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            Direction::Next => "asc",
            Direction::Prev => "desc",
        };
        match &self.index {
            Some(index) => {
                let kind = if self.unique { "UniqueIndexScan" } else { "IndexScan" };
                write!(f, "{}({}.{}, {})", kind, self.table, index, direction)?
            }
            None => write!(f, "PrimaryKeyScan({}, {})", self.table, direction)?,
        }
        if let Some(range) = &self.scan_range {
            write!(f, " bound [")?;
            write_range(f, range)?;
            write!(f, "]")?;
        }
        if let Some(range) = &self.residual_range {
            write!(f, " filter [")?;
            write_range(f, range)?;
            write!(f, "]")?;
        }
        if let Some(sort) = &self.sort {
            let order = match sort.order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            };
            write!(f, " then Sort({} {})", sort.column, order)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::Value;

    fn ctx() -> TablePlanContext {
        TablePlanContext::new("persons", "id")
            .with_index("age", false)
            .with_index("first_name", false)
            .with_column("last_name")
    }

    #[test]
    fn test_default_is_primary_key_scan() {
        let plan = plan(&ctx(), &FindOptions::new()).unwrap();
        assert_eq!(plan.index(), None);
        assert_eq!(plan.direction, Direction::Next);
        assert!(!plan.requires_manual_sort());
    }

    #[test]
    fn test_order_by_indexed_column() {
        let options = FindOptions::new().order_by("age", SortOrder::Desc);
        let plan = plan(&ctx(), &options).unwrap();
        assert_eq!(plan.index(), Some("age"));
        assert_eq!(plan.direction, Direction::Prev);
        assert!(!plan.requires_manual_sort());
    }

    #[test]
    fn test_order_by_primary_key() {
        let options = FindOptions::new().order_by("id", SortOrder::Desc);
        let plan = plan(&ctx(), &options).unwrap();
        assert_eq!(plan.index(), None);
        assert_eq!(plan.direction, Direction::Prev);
        assert!(!plan.requires_manual_sort());
    }

    #[test]
    fn test_order_by_unindexed_column_sorts_manually() {
        let options = FindOptions::new().order_by("last_name", SortOrder::Desc);
        let plan = plan(&ctx(), &options).unwrap();
        assert_eq!(plan.index(), None);
        assert_eq!(plan.direction, Direction::Next);
        assert!(plan.requires_manual_sort());
    }

    #[test]
    fn test_range_wins_over_order_by() {
        let options = FindOptions::new()
            .range("age", KeyRange::lower_bound(Value::Int64(18), false))
            .order_by("first_name", SortOrder::Asc);
        let plan = plan(&ctx(), &options).unwrap();
        assert_eq!(plan.index(), Some("age"));
        assert!(plan.scan_range.is_some());
        assert!(plan.requires_manual_sort());
    }

    #[test]
    fn test_range_and_order_on_same_column() {
        let options = FindOptions::new()
            .range("age", KeyRange::upper_bound(Value::Int64(65), true))
            .order_by("age", SortOrder::Desc);
        let plan = plan(&ctx(), &options).unwrap();
        assert_eq!(plan.index(), Some("age"));
        assert_eq!(plan.direction, Direction::Prev);
        assert!(!plan.requires_manual_sort());
    }

    #[test]
    fn test_unindexed_range_becomes_filter() {
        let options = FindOptions::new()
            .range("last_name", KeyRange::only(Value::from("Smith")))
            .order_by("age", SortOrder::Asc);
        let plan = plan(&ctx(), &options).unwrap();
        assert_eq!(plan.index(), Some("age"));
        assert!(plan.scan_range.is_none());
        assert_eq!(plan.residual_range.as_ref().map(|r| r.column.as_str()), Some("last_name"));
        assert!(!plan.requires_manual_sort());
    }

    #[test]
    fn test_unknown_columns() {
        let options = FindOptions::new().order_by("nope", SortOrder::Asc);
        assert!(matches!(plan(&ctx(), &options), Err(Error::ColumnNotFound { .. })));
        let options = FindOptions::new().range("nope", KeyRange::all());
        assert!(matches!(plan(&ctx(), &options), Err(Error::ColumnNotFound { .. })));
    }

    #[test]
    fn test_explain_display() {
        let options = FindOptions::new()
            .range("age", KeyRange::bound(Value::Int64(18), Value::Int64(65), false, true))
            .order_by("last_name", SortOrder::Desc);
        let bounded = plan(&ctx(), &options).unwrap();
        assert_eq!(
            bounded.to_string(),
            "IndexScan(persons.age, asc) bound [18 <= age < 65] then Sort(last_name desc)"
        );

        let ctx = ctx().with_index("email", true);
        let options = FindOptions::new().order_by("email", SortOrder::Desc);
        assert_eq!(
            plan(&ctx, &options).unwrap().to_string(),
            "UniqueIndexScan(persons.email, desc)"
        );
    }
}
