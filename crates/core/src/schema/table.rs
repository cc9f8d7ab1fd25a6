//! Table definition for the Tally schema.

use super::alter::{AlterTableAction, ColumnChange};
use super::column::{ColumnBuilder, ColumnDefinition};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// An immutable table definition.
///
/// A new schema is produced for every applied [`AlterTableAction`]; existing
/// schemas never change in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    primary_key: String,
    columns: Vec<ColumnDefinition>,
}

impl TableSchema {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the primary-key column name.
    #[inline]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    #[inline]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a column or fails with `ColumnNotFound`.
    pub fn column(&self, name: &str) -> Result<&ColumnDefinition> {
        self.get_column(name)
            .ok_or_else(|| Error::column_not_found(&self.name, name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    /// Returns the primary-key column definition.
    pub fn primary_key_column(&self) -> &ColumnDefinition {
        // validate() guarantees the primary key column exists
        self.columns
            .iter()
            .find(|c| c.is_primary_key())
            .unwrap_or(&self.columns[0])
    }

    /// Returns every column that owns a sorted index, primary key first.
    pub fn indexed_columns(&self) -> Vec<&ColumnDefinition> {
        let mut cols: Vec<&ColumnDefinition> = Vec::new();
        cols.push(self.primary_key_column());
        cols.extend(
            self.columns
                .iter()
                .filter(|c| !c.is_primary_key() && c.has_index()),
        );
        cols
    }

    /// Returns whether `name` is the primary key or an indexed/unique column.
    pub fn is_indexed(&self, name: &str) -> bool {
        self.get_column(name).map(|c| c.has_index()).unwrap_or(false)
    }

    /// Checks the invariants every schema must satisfy. Used for schemas read back
    /// from persisted metadata.
    pub fn validate(&self) -> Result<()> {
        check_naming_rules(&self.name)?;
        if self.columns.is_empty() {
            return Err(Error::invalid_schema(format!(
                "Table {} has no columns",
                self.name
            )));
        }
        for (i, col) in self.columns.iter().enumerate() {
            check_naming_rules(col.name())?;
            if self.columns[..i].iter().any(|c| c.name() == col.name()) {
                return Err(Error::invalid_schema(format!(
                    "Column already exists: {}",
                    col.name()
                )));
            }
        }
        let pks: Vec<&ColumnDefinition> =
            self.columns.iter().filter(|c| c.is_primary_key()).collect();
        match pks.as_slice() {
            [pk] if pk.name() == self.primary_key => {}
            [] => {
                return Err(Error::invalid_schema(format!(
                    "Table {} has no primary key",
                    self.name
                )))
            }
            [_] => {
                return Err(Error::invalid_schema(format!(
                    "Primary key of table {} does not match its column",
                    self.name
                )))
            }
            _ => {
                return Err(Error::invalid_schema(format!(
                    "Table {} declares more than one primary key",
                    self.name
                )))
            }
        }
        let pk = self.primary_key_column();
        if !pk.data_type().is_indexable() {
            return Err(Error::invalid_schema(format!(
                "Column is not indexable: {}",
                pk.name()
            )));
        }
        Ok(())
    }

    /// Replays one alteration, producing the next schema version.
    pub fn apply_action(&self, action: &AlterTableAction) -> Result<TableSchema> {
        let mut next = self.clone();
        match action {
            AlterTableAction::AddColumn(def) => {
                if def.is_primary_key() {
                    return Err(Error::invalid_schema(format!(
                        "Table {} already has primary key {}",
                        self.name, self.primary_key
                    )));
                }
                check_naming_rules(def.name())?;
                if self.has_column(def.name()) {
                    return Err(Error::invalid_schema(format!(
                        "Column already exists: {}",
                        def.name()
                    )));
                }
                check_indexable(def)?;
                next.columns.push(def.clone());
            }
            AlterTableAction::AlterColumn { column, change } => {
                let is_pk = self.column(column)?.is_primary_key();
                let col = next
                    .columns
                    .iter_mut()
                    .find(|c| c.name() == column)
                    .ok_or_else(|| Error::column_not_found(&self.name, column))?;
                match change {
                    ColumnChange::SetDataType(dt) => col.set_data_type(*dt),
                    ColumnChange::SetNullable(true) if is_pk => {
                        return Err(Error::invalid_schema("Primary key cannot be nullable"))
                    }
                    ColumnChange::SetNullable(v) => col.set_nullable(*v),
                    ColumnChange::SetIndexed(false) | ColumnChange::SetUnique(false) if is_pk => {
                        return Err(Error::invalid_schema(
                            "Primary key is always indexed and unique",
                        ))
                    }
                    ColumnChange::SetIndexed(v) => col.set_indexed(*v),
                    ColumnChange::SetUnique(v) => col.set_unique(*v),
                }
                check_indexable(col)?;
            }
            AlterTableAction::DropColumn { column } => {
                if self.column(column)?.is_primary_key() {
                    return Err(Error::invalid_schema(format!(
                        "Cannot drop primary key column {}",
                        column
                    )));
                }
                next.columns.retain(|c| c.name() != column);
            }
            AlterTableAction::RenameColumn { from, to } => {
                self.column(from)?;
                check_naming_rules(to)?;
                if self.has_column(to) {
                    return Err(Error::invalid_schema(format!("Column already exists: {}", to)));
                }
                if let Some(col) = next.columns.iter_mut().find(|c| c.name() == from) {
                    col.set_name(to.as_str());
                }
                if &self.primary_key == from {
                    next.primary_key = to.clone();
                }
            }
            AlterTableAction::RenameTable { to } => {
                check_naming_rules(to)?;
                next.name = to.clone();
            }
        }
        Ok(next)
    }
}

fn check_indexable(col: &ColumnDefinition) -> Result<()> {
    if col.has_index() && !col.data_type().is_indexable() {
        return Err(Error::invalid_schema(format!(
            "Column is not indexable: {}",
            col.name()
        )));
    }
    Ok(())
}

/// Checks that `name` is a letter or underscore followed by ASCII letters,
/// digits or underscores. Table, column and database names all follow it.
pub fn check_naming_rules(name: &str) -> Result<()> {
    let first = match name.chars().next() {
        Some(c) => c,
        None => return Err(Error::invalid_schema("Name cannot be empty")),
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(Error::invalid_schema(format!(
            "Name must start with letter or underscore: {}",
            name
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::invalid_schema(format!(
            "Name contains invalid characters: {}",
            name
        )));
    }
    Ok(())
}

/// Builder for creating table definitions.
///
/// ```rust
/// use tally_core::schema::{column, TableBuilder};
///
/// let persons = TableBuilder::new("persons")
///     .column(column("id").uuid().primary_key())
///     .column(column("firstName").string().indexed())
///     .column(column("age").int64().indexed())
///     .build()
///     .unwrap();
/// assert_eq!(persons.primary_key(), "id");
/// ```
pub struct TableBuilder {
    name: String,
    columns: Vec<ColumnDefinition>,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column declaration.
    pub fn column(mut self, column: impl Into<ColumnDefinition>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Adds several column declarations at once.
    pub fn columns(mut self, columns: impl IntoIterator<Item = ColumnBuilder>) -> Self {
        self.columns.extend(columns.into_iter().map(ColumnBuilder::build));
        self
    }

    /// Builds and validates the table definition: naming rules, unique column names
    /// and exactly one primary key.
    pub fn build(self) -> Result<TableSchema> {
        let mut columns = self.columns;
        for col in &mut columns {
            col.normalize_primary_key();
            check_indexable(col)?;
        }
        let primary_key = columns
            .iter()
            .find(|c| c.is_primary_key())
            .map(|c| c.name().to_string())
            .unwrap_or_default();
        let schema = TableSchema {
            name: self.name,
            primary_key,
            columns,
        };
        schema.validate()?;
        Ok(schema)
    }
}
