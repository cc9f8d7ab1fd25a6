//! Column definition and the fluent column builder.

use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// A column definition in a table schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    name: String,
    data_type: DataType,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    indexed: bool,
    #[serde(default)]
    unique: bool,
}

impl ColumnDefinition {
    /// Creates a non-nullable, unindexed column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            nullable: false,
            indexed: false,
            unique: false,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    #[inline]
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    #[inline]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns true if the storage layer keeps a sorted index for this column.
    pub fn has_index(&self) -> bool {
        self.primary_key || self.indexed || self.unique
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    pub(crate) fn set_nullable(&mut self, nullable: bool) {
        self.nullable = nullable;
    }

    pub(crate) fn set_indexed(&mut self, indexed: bool) {
        self.indexed = indexed;
    }

    pub(crate) fn set_unique(&mut self, unique: bool) {
        self.unique = unique;
    }

    /// Primary keys are always indexed, unique and non-nullable.
    pub(crate) fn normalize_primary_key(&mut self) {
        if self.primary_key {
            self.indexed = true;
            self.unique = true;
            self.nullable = false;
        }
    }
}

/// Starts a fluent column declaration: `column("id").string().primary_key()`.
pub fn column(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder {
        def: ColumnDefinition::new(name, DataType::String),
    }
}

/// Fluent builder for a [`ColumnDefinition`]. The data type defaults to `String`.
#[derive(Clone, Debug)]
pub struct ColumnBuilder {
    def: ColumnDefinition,
}

impl ColumnBuilder {
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.def.data_type = data_type;
        self
    }

    pub fn boolean(self) -> Self {
        self.data_type(DataType::Boolean)
    }

    pub fn int64(self) -> Self {
        self.data_type(DataType::Int64)
    }

    pub fn float64(self) -> Self {
        self.data_type(DataType::Float64)
    }

    pub fn string(self) -> Self {
        self.data_type(DataType::String)
    }

    pub fn date_time(self) -> Self {
        self.data_type(DataType::DateTime)
    }

    pub fn uuid(self) -> Self {
        self.data_type(DataType::Uuid)
    }

    pub fn json(self) -> Self {
        self.data_type(DataType::Json)
    }

    pub fn primary_key(mut self) -> Self {
        self.def.primary_key = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.def.nullable = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.def.indexed = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.def.unique = true;
        self
    }

    pub fn build(self) -> ColumnDefinition {
        let mut def = self.def;
        def.normalize_primary_key();
        def
    }
}

impl From<ColumnBuilder> for ColumnDefinition {
    fn from(builder: ColumnBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_builder() {
        let col = column("email").string().nullable().unique().build();
        assert_eq!(col.name(), "email");
        assert_eq!(col.data_type(), DataType::String);
        assert!(col.is_nullable());
        assert!(col.is_unique());
        assert!(!col.is_indexed());
        assert!(col.has_index());
    }

    #[test]
    fn test_primary_key_is_normalized() {
        let col = column("id").uuid().nullable().primary_key().build();
        assert!(col.is_primary_key());
        assert!(col.is_indexed());
        assert!(col.is_unique());
        assert!(!col.is_nullable());
    }

    #[test]
    fn test_plain_column_has_no_index() {
        let col = column("note").build();
        assert_eq!(col.data_type(), DataType::String);
        assert!(!col.has_index());
    }
}
