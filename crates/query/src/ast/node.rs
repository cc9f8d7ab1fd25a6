//! Where tree definitions.
//!
//! A [`WhereNode`] is immutable data: combinators consume nodes and return new
//! ones, and evaluation lives in [`crate::eval`].

use core::fmt;
use tally_core::Value;

/// Sort order for `order_by`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Logical operators joining the children of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A condition operator together with its operand.
#[derive(Clone, Debug, PartialEq)]
pub enum Operator {
    Equals(Value),
    NotEquals(Value),
    Contains(String),
    NotContains(String),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    IsNull,
    IsNotNull,
}

impl Operator {
    /// Returns the builder name of the operator.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Equals(_) => "equals",
            Operator::NotEquals(_) => "not_equals",
            Operator::Contains(_) => "contains",
            Operator::NotContains(_) => "not_contains",
            Operator::In(_) => "in",
            Operator::NotIn(_) => "not_in",
            Operator::Lt(_) => "lt",
            Operator::Lte(_) => "lte",
            Operator::Gt(_) => "gt",
            Operator::Gte(_) => "gte",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
        }
    }
}

/// A single column test.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
}

impl Condition {
    pub fn new(column: impl Into<String>, operator: Operator) -> Self {
        Self {
            column: column.into(),
            operator,
        }
    }
}

/// Children joined by one logical operator.
#[derive(Clone, Debug, PartialEq)]
pub struct BooleanGroup {
    pub op: LogicalOp,
    pub children: Vec<WhereNode>,
}

/// A node of a where tree.
#[derive(Clone, Debug, PartialEq)]
pub enum WhereNode {
    Condition(Condition),
    Group(BooleanGroup),
}

impl WhereNode {
    /// Builds a group directly from its children.
    pub fn group(op: LogicalOp, children: Vec<WhereNode>) -> Self {
        WhereNode::Group(BooleanGroup { op, children })
    }

    /// Combines with `other` under AND.
    ///
    /// An AND group absorbs `other` instead of nesting, and an AND group on the
    /// right is spliced in as well.
    pub fn and(self, other: WhereNode) -> Self {
        self.combine(LogicalOp::And, other)
    }

    /// Combines with `other` under OR, flattening like [`WhereNode::and`].
    pub fn or(self, other: WhereNode) -> Self {
        self.combine(LogicalOp::Or, other)
    }

    fn combine(self, op: LogicalOp, other: WhereNode) -> Self {
        let mut children = match self {
            WhereNode::Group(group) if group.op == op => group.children,
            node => vec![node],
        };
        match other {
            WhereNode::Group(group) if group.op == op => children.extend(group.children),
            node => children.push(node),
        }
        WhereNode::group(op, children)
    }

    /// Returns the distinct columns referenced by the tree, in first-seen order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            WhereNode::Condition(c) => {
                if !out.contains(&c.column.as_str()) {
                    out.push(&c.column);
                }
            }
            WhereNode::Group(g) => {
                for child in &g.children {
                    child.collect_columns(out);
                }
            }
        }
    }

    /// Returns the depth of the tree; a single condition has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            WhereNode::Condition(_) => 1,
            WhereNode::Group(g) => 1 + g.children.iter().map(WhereNode::depth).max().unwrap_or(0),
        }
    }
}

impl From<Condition> for WhereNode {
    fn from(condition: Condition) -> Self {
        WhereNode::Condition(condition)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    write!(f, "[")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v)?;
    }
    write!(f, "]")
}

impl fmt::Display for WhereNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhereNode::Condition(c) => {
                write!(f, "{} {}", c.column, c.operator.name())?;
                match &c.operator {
                    Operator::Equals(v)
                    | Operator::NotEquals(v)
                    | Operator::Lt(v)
                    | Operator::Lte(v)
                    | Operator::Gt(v)
                    | Operator::Gte(v) => write!(f, " {}", v),
                    Operator::Contains(s) | Operator::NotContains(s) => write!(f, " {:?}", s),
                    Operator::In(vs) | Operator::NotIn(vs) => {
                        write!(f, " ")?;
                        write_list(f, vs)
                    }
                    Operator::IsNull | Operator::IsNotNull => Ok(()),
                }
            }
            WhereNode::Group(g) => {
                let sep = match g.op {
                    LogicalOp::And => " AND ",
                    LogicalOp::Or => " OR ",
                };
                write!(f, "(")?;
                for (i, child) in g.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::col;

    #[test]
    fn test_and_flattens() {
        let node = col("a").equals(1).and(col("b").equals(2)).and(col("c").equals(3));
        match &node {
            WhereNode::Group(g) => {
                assert_eq!(g.op, LogicalOp::And);
                assert_eq!(g.children.len(), 3);
            }
            _ => panic!("expected group"),
        }
        assert_eq!(node.depth(), 2);
    }

    #[test]
    fn test_mixed_ops_nest() {
        let node = col("a").equals(1).and(col("b").equals(2)).or(col("c").equals(3));
        match &node {
            WhereNode::Group(g) => {
                assert_eq!(g.op, LogicalOp::Or);
                assert_eq!(g.children.len(), 2);
                assert!(matches!(&g.children[0], WhereNode::Group(inner) if inner.op == LogicalOp::And));
            }
            _ => panic!("expected group"),
        }
        assert_eq!(node.depth(), 3);
    }

    #[test]
    fn test_right_group_is_spliced() {
        let right = col("b").equals(2).or(col("c").equals(3));
        let node = col("a").equals(1).or(right);
        match node {
            WhereNode::Group(g) => assert_eq!(g.children.len(), 3),
            _ => panic!("expected group"),
        }
    }

    #[test]
    fn test_columns() {
        let node = col("a").gt(1).and(col("b").is_null()).or(col("a").lt(0));
        assert_eq!(node.columns(), vec!["a", "b"]);
    }

    #[test]
    fn test_display() {
        let node = col("age").gte(18).and(col("name").in_list(["Ann", "Bo"]));
        assert_eq!(node.to_string(), r#"(age gte 18 AND name in ["Ann", "Bo"])"#);
    }
}
