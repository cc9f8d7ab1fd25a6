//! Where tree evaluation.
//!
//! Evaluation is a single recursive descent over the tree. Groups short-circuit:
//! AND stops at the first false child and OR at the first true one.

use crate::ast::{BooleanGroup, Condition, LogicalOp, Operator, WhereNode};
use core::cmp::Ordering;
use tally_core::{Row, Value};

/// Something that can accept or reject a row.
pub trait Predicate {
    /// Evaluates the predicate against a row.
    fn eval(&self, row: &Row) -> bool;
}

impl Predicate for Condition {
    fn eval(&self, row: &Row) -> bool {
        let value = row.value(&self.column);
        match &self.operator {
            Operator::Equals(v) => value.loosely_equals(v),
            Operator::NotEquals(v) => !value.loosely_equals(v),
            Operator::Contains(needle) => value.as_str().map_or(false, |s| s.contains(needle.as_str())),
            Operator::NotContains(needle) => {
                value.as_str().map_or(false, |s| !s.contains(needle.as_str()))
            }
            Operator::In(list) => list.iter().any(|v| value.loosely_equals(v)),
            Operator::NotIn(list) => !list.iter().any(|v| value.loosely_equals(v)),
            Operator::Lt(v) => compare(value, v).map_or(false, |o| o == Ordering::Less),
            Operator::Lte(v) => compare(value, v).map_or(false, |o| o != Ordering::Greater),
            Operator::Gt(v) => compare(value, v).map_or(false, |o| o == Ordering::Greater),
            Operator::Gte(v) => compare(value, v).map_or(false, |o| o != Ordering::Less),
            Operator::IsNull => value.is_null(),
            Operator::IsNotNull => !value.is_null(),
        }
    }
}

impl Predicate for BooleanGroup {
    fn eval(&self, row: &Row) -> bool {
        match self.op {
            LogicalOp::And => self.children.iter().all(|c| c.eval(row)),
            LogicalOp::Or => self.children.iter().any(|c| c.eval(row)),
        }
    }
}

impl Predicate for WhereNode {
    fn eval(&self, row: &Row) -> bool {
        match self {
            WhereNode::Condition(c) => c.eval(row),
            WhereNode::Group(g) => g.eval(row),
        }
    }
}

/// An absent filter accepts every row.
impl<P: Predicate> Predicate for Option<P> {
    fn eval(&self, row: &Row) -> bool {
        self.as_ref().map_or(true, |p| p.eval(row))
    }
}

impl<P: Predicate + ?Sized> Predicate for &P {
    fn eval(&self, row: &Row) -> bool {
        (**self).eval(row)
    }
}

/// Ordering of two values for `lt/lte/gt/gte`, or `None` when they cannot be
/// compared. Null is never comparable.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if left.is_comparable_with(right) {
        Some(left.cmp(right))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{and_all, col, or_all};

    fn matches(node: &WhereNode, row: &Row) -> bool {
        node.eval(row)
    }

    fn person() -> Row {
        Row::new()
            .with("name", "Alice")
            .with("age", 31)
            .with("score", 7.5)
            .with("nickname", Value::Null)
    }

    #[test]
    fn test_equality_is_numeric_across_types() {
        let row = person();
        assert!(matches(&col("age").equals(31.0), &row));
        assert!(matches(&col("score").not_equals(7), &row));
        assert!(matches(&col("name").equals("Alice"), &row));
        assert!(!matches(&col("name").equals("alice"), &row));
    }

    #[test]
    fn test_contains_only_on_strings() {
        let row = person();
        assert!(matches(&col("name").contains("lic"), &row));
        assert!(matches(&col("name").not_contains("bob"), &row));
        assert!(!matches(&col("age").contains("3"), &row));
        assert!(!matches(&col("age").not_contains("3"), &row));
        assert!(!matches(&col("nickname").not_contains("x"), &row));
    }

    #[test]
    fn test_membership() {
        let row = person();
        assert!(matches(&col("age").in_list([30, 31]), &row));
        assert!(matches(&col("name").not_in(["Bob"]), &row));
        assert!(!matches(&col("age").in_list(Vec::<i64>::new()), &row));
    }

    #[test]
    fn test_comparisons() {
        let row = person();
        assert!(matches(&col("age").gt(30), &row));
        assert!(matches(&col("age").gte(31), &row));
        assert!(matches(&col("age").lte(31.0), &row));
        assert!(!matches(&col("age").lt(31), &row));
        assert!(matches(&col("name").lt("Bob"), &row));
        // Mixed kinds never compare
        assert!(!matches(&col("name").gt(1), &row));
        assert!(!matches(&col("age").lt("zzz"), &row));
    }

    #[test]
    fn test_null_never_compares() {
        let row = person();
        for node in [
            col("nickname").lt(1),
            col("nickname").gt(1),
            col("missing").lte("a"),
            col("missing").gte(Value::Null),
        ] {
            assert!(!matches(&node, &row), "{} should not match", node);
        }
        assert!(matches(&col("nickname").is_null(), &row));
        assert!(matches(&col("missing").is_null(), &row));
        assert!(matches(&col("name").is_not_null(), &row));
    }

    #[test]
    fn test_groups() {
        let row = person();
        assert!(matches(&col("age").gt(30).and(col("name").contains("A")), &row));
        assert!(!matches(&col("age").gt(40).and(col("name").contains("A")), &row));
        assert!(matches(&col("age").gt(40).or(col("name").contains("A")), &row));
        assert!(matches(&and_all(Vec::new()), &row));
        assert!(!matches(&or_all(Vec::new()), &row));
    }

    #[test]
    fn test_absent_filter_matches() {
        let absent: Option<&WhereNode> = None;
        assert!(absent.eval(&person()));
        assert!(!Some(&col("age").lt(0)).eval(&person()));
    }
}
