//! Column-scoped where builder.

use super::node::{Condition, LogicalOp, Operator, WhereNode};
use tally_core::Value;

/// Starts a condition on `name`.
pub fn col(name: impl Into<String>) -> ColumnScope {
    ColumnScope { column: name.into() }
}

/// Builds an AND group from `nodes`. An empty group matches every row.
pub fn and_all(nodes: impl IntoIterator<Item = WhereNode>) -> WhereNode {
    WhereNode::group(LogicalOp::And, nodes.into_iter().collect())
}

/// Builds an OR group from `nodes`. An empty group matches no row.
pub fn or_all(nodes: impl IntoIterator<Item = WhereNode>) -> WhereNode {
    WhereNode::group(LogicalOp::Or, nodes.into_iter().collect())
}

/// A column awaiting its operator.
#[derive(Clone, Debug)]
pub struct ColumnScope {
    column: String,
}

impl ColumnScope {
    fn condition(self, operator: Operator) -> WhereNode {
        WhereNode::Condition(Condition::new(self.column, operator))
    }

    pub fn equals(self, value: impl Into<Value>) -> WhereNode {
        self.condition(Operator::Equals(value.into()))
    }

    pub fn not_equals(self, value: impl Into<Value>) -> WhereNode {
        self.condition(Operator::NotEquals(value.into()))
    }

    /// Substring test; only string values can match.
    pub fn contains(self, needle: impl Into<String>) -> WhereNode {
        self.condition(Operator::Contains(needle.into()))
    }

    pub fn not_contains(self, needle: impl Into<String>) -> WhereNode {
        self.condition(Operator::NotContains(needle.into()))
    }

    pub fn in_list<I, V>(self, values: I) -> WhereNode
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.condition(Operator::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn not_in<I, V>(self, values: I) -> WhereNode
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.condition(Operator::NotIn(values.into_iter().map(Into::into).collect()))
    }

    pub fn lt(self, value: impl Into<Value>) -> WhereNode {
        self.condition(Operator::Lt(value.into()))
    }

    pub fn lte(self, value: impl Into<Value>) -> WhereNode {
        self.condition(Operator::Lte(value.into()))
    }

    pub fn gt(self, value: impl Into<Value>) -> WhereNode {
        self.condition(Operator::Gt(value.into()))
    }

    pub fn gte(self, value: impl Into<Value>) -> WhereNode {
        self.condition(Operator::Gte(value.into()))
    }

    pub fn is_null(self) -> WhereNode {
        self.condition(Operator::IsNull)
    }

    pub fn is_not_null(self) -> WhereNode {
        self.condition(Operator::IsNotNull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_operands() {
        let node = col("age").gt(30);
        assert_eq!(
            node,
            WhereNode::Condition(Condition::new("age", Operator::Gt(Value::Int64(30))))
        );

        let node = col("name").in_list(["a", "b"]);
        match node {
            WhereNode::Condition(c) => assert_eq!(
                c.operator,
                Operator::In(vec![Value::String("a".into()), Value::String("b".into())])
            ),
            _ => panic!("expected condition"),
        }
    }

    #[test]
    fn test_group_helpers() {
        let node = and_all([col("a").is_null(), col("b").is_not_null()]);
        assert!(matches!(node, WhereNode::Group(ref g) if g.op == LogicalOp::And && g.children.len() == 2));
        let node = or_all(Vec::new());
        assert!(matches!(node, WhereNode::Group(ref g) if g.children.is_empty()));
    }
}
