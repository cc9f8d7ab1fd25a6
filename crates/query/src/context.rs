//! Planning context for single-table queries.

use tally_storage::IndexedTable;

/// Information about an index the planner may scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexInfo {
    /// Indexed column.
    pub column: String,
    /// Whether this is a unique index.
    pub is_unique: bool,
}

impl IndexInfo {
    pub fn new(column: impl Into<String>, is_unique: bool) -> Self {
        Self {
            column: column.into(),
            is_unique,
        }
    }
}

/// Table metadata the planner needs: the primary key, the secondary indexes
/// and the declared columns.
#[derive(Clone, Debug, Default)]
pub struct TablePlanContext {
    table: String,
    primary_key: String,
    columns: Vec<String>,
    indexes: Vec<IndexInfo>,
}

impl TablePlanContext {
    /// Creates a context with no secondary indexes.
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        let primary_key = primary_key.into();
        Self {
            table: table.into(),
            columns: vec![primary_key.clone()],
            primary_key,
            indexes: Vec::new(),
        }
    }

    /// Captures the metadata of a live table.
    pub fn from_table(table: &IndexedTable) -> Self {
        let schema = table.schema();
        Self {
            table: schema.name().to_string(),
            primary_key: schema.primary_key().to_string(),
            columns: schema.columns().iter().map(|c| c.name().to_string()).collect(),
            indexes: table
                .index_names()
                .into_iter()
                .map(|name| {
                    let unique = table.is_unique(&name);
                    IndexInfo::new(name, unique)
                })
                .collect(),
        }
    }

    /// Declares a column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
        self
    }

    /// Declares an indexed column.
    pub fn with_index(mut self, column: impl Into<String>, is_unique: bool) -> Self {
        let column = column.into();
        self = self.with_column(column.clone());
        self.indexes.push(IndexInfo::new(column, is_unique));
        self
    }

    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[inline]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    #[inline]
    pub fn indexes(&self) -> &[IndexInfo] {
        &self.indexes
    }

    /// Returns true if `column` has a unique secondary index.
    pub fn is_unique(&self, column: &str) -> bool {
        self.indexes.iter().any(|i| i.column == column && i.is_unique)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Returns true if `column` can be scanned in key order: the primary key
    /// or a secondary index.
    pub fn is_scannable(&self, column: &str) -> bool {
        column == self.primary_key || self.indexes.iter().any(|i| i.column == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::schema::{column, TableBuilder};

    #[test]
    fn test_from_table() {
        let schema = TableBuilder::new("persons")
            .column(column("id").int64().primary_key())
            .column(column("age").int64().indexed())
            .column(column("email").string().unique())
            .column(column("note").string().nullable())
            .build()
            .unwrap();
        let ctx = TablePlanContext::from_table(&IndexedTable::new(schema));

        assert_eq!(ctx.table(), "persons");
        assert_eq!(ctx.primary_key(), "id");
        assert!(ctx.is_scannable("id"));
        assert!(ctx.is_scannable("age"));
        assert!(ctx.is_scannable("email"));
        assert!(!ctx.is_scannable("note"));
        assert!(ctx.has_column("note"));
        assert!(ctx.is_unique("email"));
        assert!(!ctx.is_unique("age"));
    }

    #[test]
    fn test_builder() {
        let ctx = TablePlanContext::new("t", "id").with_index("a", false).with_column("b");
        assert!(ctx.is_scannable("a"));
        assert!(!ctx.is_scannable("b"));
        assert!(ctx.has_column("b"));
        assert!(!ctx.has_column("c"));
    }
}
