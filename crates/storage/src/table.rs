//! Indexed table storage.
//!
//! An [`IndexedTable`] stores the rows of one table keyed by primary key and
//! keeps one [`SortedIndex`] per primary-key, indexed or unique column. Every
//! write path checks all constraints before touching an index, so a failed
//! write leaves the table exactly as it was.
//!
//! Unique columns reject duplicate non-null values; any number of rows may hold
//! `Null` in a nullable unique column.

use crate::cursor::Cursor;
use hashbrown::HashMap;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;
use tally_core::schema::{AlterTableAction, ColumnChange, ColumnDefinition, TableSchema};
use tally_core::{Error, Result, Row, Value};
use tally_index::{Direction, IndexError, KeyRange, SortedIndex};

/// Sorted index from column value to primary key.
pub type ColumnIndex = SortedIndex<Value, Value>;

/// Rows and indexes of a single table.
#[derive(Clone, Debug)]
pub struct IndexedTable {
    schema: TableSchema,
    rows: HashMap<Value, Rc<Row>>,
    /// Column name → index. Always holds the primary-key index.
    indexes: BTreeMap<String, ColumnIndex>,
    locked: bool,
}

impl IndexedTable {
    /// Creates an empty table with an index for every indexed column.
    pub fn new(schema: TableSchema) -> Self {
        let indexes = schema
            .indexed_columns()
            .into_iter()
            .map(|c| (c.name().to_string(), ColumnIndex::new(strict_unique(c))))
            .collect();
        Self {
            schema,
            rows: HashMap::new(),
            indexes,
            locked: false,
        }
    }

    /// Restores a table from persisted rows, rebuilding every index wholesale.
    pub fn from_rows(schema: TableSchema, rows: impl IntoIterator<Item = Row>) -> Result<Self> {
        let mut table = Self::new(schema);
        let pk_column = table.schema.primary_key().to_string();
        for row in rows {
            let row = table.prepare_row(row)?;
            let pk = row.value(&pk_column).clone();
            if table.rows.insert(pk.clone(), Rc::new(row)).is_some() {
                return Err(Error::unique_constraint(pk_column, pk));
            }
        }
        table.indexes = build_indexes(&table.schema, table.rows.values())?;
        Ok(table)
    }

    #[inline]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true while a cursor holds the table.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    fn check_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(Error::table_locked(self.name()));
        }
        Ok(())
    }

    /// Gets a row by primary key.
    pub fn get(&self, pk: &Value) -> Option<Rc<Row>> {
        self.rows.get(pk).cloned()
    }

    pub(crate) fn replace_row(&mut self, pk: Value, row: Rc<Row>) {
        self.rows.insert(pk, row);
    }

    /// Returns all rows in primary-key order.
    pub fn rows(&self) -> Vec<Rc<Row>> {
        self.primary_index()
            .iter(Direction::Next)
            .filter_map(|(pk, _)| self.rows.get(pk).cloned())
            .collect()
    }

    /// Returns the index on `column`, including the primary-key index.
    pub fn index(&self, column: &str) -> Option<&ColumnIndex> {
        self.indexes.get(column)
    }

    fn primary_index(&self) -> &ColumnIndex {
        // new() and every schema change keep the primary-key index present
        &self.indexes[self.schema.primary_key()]
    }

    /// Returns true if `column` is unique and another row already holds the
    /// non-null `key`.
    pub fn is_taken(&self, column: &str, key: &Value) -> bool {
        if key.is_null() || !self.is_unique(column) {
            return false;
        }
        self.indexes
            .get(column)
            .map(|index| index.contains_key(key))
            .unwrap_or(false)
    }

    /// Returns true if `column` carries a unique constraint.
    pub fn is_unique(&self, column: &str) -> bool {
        self.schema
            .get_column(column)
            .map(|c| c.is_unique())
            .unwrap_or(false)
    }

    /// Returns the names of the secondary indexes (every indexed column except
    /// the primary key).
    pub fn index_names(&self) -> Vec<String> {
        self.indexes
            .keys()
            .filter(|name| name.as_str() != self.schema.primary_key())
            .cloned()
            .collect()
    }

    /// Coerces a full row to the schema, filling absent columns with `Null`.
    fn prepare_row(&self, row: Row) -> Result<Row> {
        for column in row.columns() {
            self.schema.column(column)?;
        }
        let mut prepared = Row::new();
        for col in self.schema.columns() {
            let value = row.value(col.name()).clone();
            let value = coerce(col.name(), col.data_type(), value)?;
            if value.is_null() && !col.is_nullable() {
                return Err(Error::null_constraint(col.name()));
            }
            prepared.set(col.name(), value);
        }
        Ok(prepared)
    }

    /// Coerces the columns of a partial update to the schema.
    pub fn prepare_partial(&self, partial: &Row) -> Result<Row> {
        let mut prepared = Row::new();
        for (column, value) in partial.iter() {
            let col = self.schema.column(column)?;
            let value = coerce(column, col.data_type(), value.clone())?;
            if value.is_null() && !col.is_nullable() {
                return Err(Error::null_constraint(column));
            }
            prepared.set(column, value);
        }
        Ok(prepared)
    }

    /// Rejects a partial row that would change the primary key of `current`.
    pub fn check_primary_key(&self, current: &Row, partial: &Row) -> Result<()> {
        let pk = self.schema.primary_key();
        match partial.get(pk) {
            Some(value) if value != current.value(pk) => {
                Err(Error::primary_key_immutable(self.name(), pk))
            }
            _ => Ok(()),
        }
    }

    /// Inserts a row after checking every constraint.
    pub fn insert(&mut self, row: Row) -> Result<Rc<Row>> {
        self.check_unlocked()?;
        let row = self.prepare_row(row)?;

        for column in self.indexes.keys() {
            let key = row.value(column);
            if self.is_taken(column, key) {
                return Err(Error::unique_constraint(column.as_str(), key.clone()));
            }
        }

        let pk = row.value(self.schema.primary_key()).clone();
        for (column, index) in self.indexes.iter_mut() {
            index
                .add(row.value(column).clone(), pk.clone())
                .map_err(|e| index_error(column, row.value(column), e))?;
        }
        let row = Rc::new(row);
        self.rows.insert(pk, Rc::clone(&row));
        Ok(row)
    }

    /// Inserts every row or none of them.
    pub fn insert_all(&mut self, rows: impl IntoIterator<Item = Row>) -> Result<Vec<Rc<Row>>> {
        let mut inserted: Vec<Rc<Row>> = Vec::new();
        for row in rows {
            match self.insert(row) {
                Ok(row) => inserted.push(row),
                Err(e) => {
                    let pk_column = self.schema.primary_key().to_string();
                    for row in &inserted {
                        self.remove_row(row.value(&pk_column));
                    }
                    return Err(e);
                }
            }
        }
        Ok(inserted)
    }

    /// Removes every row and clears every index.
    pub fn delete_all(&mut self) -> Result<usize> {
        self.check_unlocked()?;
        let count = self.rows.len();
        self.rows.clear();
        for index in self.indexes.values_mut() {
            index.clear();
        }
        Ok(count)
    }

    /// Moves `pk` from the `old` bucket to the `new` bucket of the index on
    /// `column`. Columns without an index are ignored.
    pub fn update_row_column_indexing(
        &mut self,
        pk: &Value,
        column: &str,
        old: &Value,
        new: &Value,
    ) -> Result<()> {
        match self.indexes.get_mut(column) {
            Some(index) => index
                .update(old, new.clone(), pk.clone())
                .map_err(|e| index_error(column, new, e)),
            None => Ok(()),
        }
    }

    /// Removes `pk` from every index, using `row` to locate its buckets.
    pub fn remove_row_indexing(&mut self, pk: &Value, row: &Row) {
        for (column, index) in self.indexes.iter_mut() {
            index.remove(row.value(column), pk);
        }
    }

    pub(crate) fn remove_row(&mut self, pk: &Value) -> Option<Rc<Row>> {
        let row = self.rows.remove(pk)?;
        self.remove_row_indexing(pk, &row);
        Some(row)
    }

    /// Merges `partial` into the row with primary key `pk`.
    pub fn update(&mut self, pk: &Value, partial: &Row) -> Result<Rc<Row>> {
        self.check_unlocked()?;
        let current = self
            .get(pk)
            .ok_or_else(|| Error::not_found(self.name(), pk.to_string()))?;
        self.check_primary_key(&current, partial)?;
        let partial = self.prepare_partial(partial)?;

        let mut next = (*current).clone();
        let changed = next.merge(&partial);

        for (column, _) in &changed {
            let key = next.value(column);
            if self.is_taken(column, key) {
                return Err(Error::unique_constraint(column.as_str(), key.clone()));
            }
        }
        for (column, old) in &changed {
            let new = next.value(column).clone();
            self.update_row_column_indexing(pk, column, old, &new)?;
        }

        let next = Rc::new(next);
        self.rows.insert(pk.clone(), Rc::clone(&next));
        Ok(next)
    }

    /// Deletes the row with primary key `pk`.
    pub fn delete(&mut self, pk: &Value) -> Result<Rc<Row>> {
        self.check_unlocked()?;
        self.remove_row(pk)
            .ok_or_else(|| Error::not_found(self.name(), pk.to_string()))
    }

    /// Builds an index on a populated column and records it in the schema.
    pub fn create_index(&mut self, column: &str, unique: bool) -> Result<()> {
        self.check_unlocked()?;
        if self.indexes.contains_key(column) {
            return Err(Error::IndexAlreadyExists {
                table: self.name().to_string(),
                column: column.to_string(),
            });
        }
        let schema = self.schema.apply_action(&AlterTableAction::AlterColumn {
            column: column.to_string(),
            change: ColumnChange::SetIndexed(true),
        })?;
        let schema = schema.apply_action(&AlterTableAction::AlterColumn {
            column: column.to_string(),
            change: ColumnChange::SetUnique(unique),
        })?;
        let index = build_index(schema.column(column)?, self.rows.values(), schema.primary_key())?;
        self.indexes.insert(column.to_string(), index);
        self.schema = schema;
        Ok(())
    }

    /// Drops the index on `column` and clears its indexed/unique flags.
    pub fn remove_index(&mut self, column: &str) -> Result<()> {
        self.check_unlocked()?;
        self.schema.column(column)?;
        if !self.indexes.contains_key(column) {
            return Err(Error::IndexNotFound {
                table: self.name().to_string(),
                column: column.to_string(),
            });
        }
        let mut schema = self.schema.clone();
        for change in [ColumnChange::SetUnique(false), ColumnChange::SetIndexed(false)] {
            schema = schema.apply_action(&AlterTableAction::AlterColumn {
                column: column.to_string(),
                change,
            })?;
        }
        self.indexes.remove(column);
        self.schema = schema;
        Ok(())
    }

    /// Replays one alteration onto the stored rows and indexes.
    ///
    /// The schema, rows and indexes are only replaced once the whole action has
    /// been validated.
    pub fn apply_alter(&mut self, action: &AlterTableAction) -> Result<()> {
        self.check_unlocked()?;
        let schema = self.schema.apply_action(action)?;

        let rows: Option<HashMap<Value, Rc<Row>>> = match action {
            AlterTableAction::AddColumn(def) => {
                if !def.is_nullable() && !self.rows.is_empty() {
                    return Err(Error::null_constraint(def.name()));
                }
                Some(self.map_rows(|row| {
                    row.set(def.name(), Value::Null);
                    Ok(())
                })?)
            }
            AlterTableAction::DropColumn { column } => Some(self.map_rows(|row| {
                row.remove(column);
                Ok(())
            })?),
            AlterTableAction::RenameColumn { from, to } => Some(self.map_rows(|row| {
                let value = row.remove(from).unwrap_or(Value::Null);
                row.set(to.as_str(), value);
                Ok(())
            })?),
            AlterTableAction::AlterColumn {
                column,
                change: ColumnChange::SetDataType(dt),
            } => Some(self.map_rows(|row| {
                let value = row.value(column).clone();
                let value = coerce(column, *dt, value)?;
                row.set(column.as_str(), value);
                Ok(())
            })?),
            AlterTableAction::AlterColumn {
                column,
                change: ColumnChange::SetNullable(false),
            } => {
                if self.rows.values().any(|r| r.value(column).is_null()) {
                    return Err(Error::null_constraint(column.as_str()));
                }
                None
            }
            _ => None,
        };

        let indexes = match &rows {
            Some(rows) => build_indexes(&schema, rows.values())?,
            None => self.sync_indexes(&schema)?,
        };

        if let Some(rows) = rows {
            self.rows = rows;
        }
        self.indexes = indexes;
        self.schema = schema;
        Ok(())
    }

    /// Applies `f` to a copy of every row.
    fn map_rows(
        &self,
        mut f: impl FnMut(&mut Row) -> Result<()>,
    ) -> Result<HashMap<Value, Rc<Row>>> {
        self.rows
            .iter()
            .map(|(pk, row)| {
                let mut row = (**row).clone();
                f(&mut row)?;
                Ok((pk.clone(), Rc::new(row)))
            })
            .collect()
    }

    /// Keeps indexes whose constraints are unchanged and builds the rest.
    fn sync_indexes(&self, schema: &TableSchema) -> Result<BTreeMap<String, ColumnIndex>> {
        let mut indexes = BTreeMap::new();
        for col in schema.indexed_columns() {
            let unchanged = self.schema.get_column(col.name()).map_or(false, |old| {
                old.is_unique() == col.is_unique() && old.is_nullable() == col.is_nullable()
            });
            let index = match self.indexes.get(col.name()) {
                Some(existing) if unchanged => existing.clone(),
                _ => build_index(col, self.rows.values(), schema.primary_key())?,
            };
            indexes.insert(col.name().to_string(), index);
        }
        Ok(indexes)
    }

    /// Renames the table in its schema.
    pub fn rename(&mut self, to: &str) -> Result<()> {
        self.apply_alter(&AlterTableAction::RenameTable { to: to.to_string() })
    }
}

fn coerce(column: &str, dt: tally_core::DataType, value: Value) -> Result<Value> {
    let original = value.clone();
    value
        .coerce_to(dt)
        .ok_or_else(|| Error::type_mismatch(column, dt, &original))
}

fn index_error(column: &str, key: &Value, e: IndexError) -> Error {
    match e {
        IndexError::DuplicateKey => Error::unique_constraint(column, key.clone()),
        IndexError::KeyNotFound => {
            Error::invalid_operation(format!("Index on {} has no entry for {}", column, key))
        }
    }
}

/// Nullable unique columns are stored in a non-unique index so that several
/// rows may hold `Null`; their non-null keys are checked by the table.
fn strict_unique(col: &ColumnDefinition) -> bool {
    col.is_unique() && !col.is_nullable()
}

fn build_index<'a>(
    col: &ColumnDefinition,
    rows: impl Iterator<Item = &'a Rc<Row>>,
    pk_column: &str,
) -> Result<ColumnIndex> {
    let column = col.name();
    // Primary key order first, so each bucket lists its keys deterministically
    let mut pairs: Vec<(Value, Value)> = rows
        .map(|row| (row.value(column).clone(), row.value(pk_column).clone()))
        .collect();
    pairs.sort_by(|a, b| a.1.cmp(&b.1));
    let mut index =
        ColumnIndex::build(pairs, false).map_err(|e| index_error(column, &Value::Null, e))?;
    if col.is_unique() {
        if let Some(dup) = index
            .entries()
            .iter()
            .find(|e| !e.key().is_null() && e.primary_keys().len() > 1)
        {
            return Err(Error::unique_constraint(column, dup.key().clone()));
        }
    }
    index
        .set_unique(strict_unique(col))
        .map_err(|e| index_error(column, &Value::Null, e))?;
    Ok(index)
}

fn build_indexes<'a>(
    schema: &TableSchema,
    rows: impl Iterator<Item = &'a Rc<Row>> + Clone,
) -> Result<BTreeMap<String, ColumnIndex>> {
    schema
        .indexed_columns()
        .into_iter()
        .map(|col| {
            let index = build_index(col, rows.clone(), schema.primary_key())?;
            Ok((col.name().to_string(), index))
        })
        .collect()
}

/// A table shared between the cache, transactions and cursors.
///
/// Borrows are taken per operation; exclusivity while iterating is enforced by
/// the table's cursor lock rather than by a held borrow.
#[derive(Clone, Debug)]
pub struct SharedTable(Rc<RefCell<IndexedTable>>);

impl SharedTable {
    pub fn new(table: IndexedTable) -> Self {
        Self(Rc::new(RefCell::new(table)))
    }

    #[inline]
    pub fn borrow(&self) -> Ref<'_, IndexedTable> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, IndexedTable> {
        self.0.borrow_mut()
    }

    /// Returns true if both handles point at the same table.
    pub fn ptr_eq(&self, other: &SharedTable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Replaces the table contents, keeping every handle valid.
    pub fn replace(&self, table: IndexedTable) -> IndexedTable {
        self.0.replace(table)
    }

    /// Opens a cursor over the index on `column` (the primary key when `None`),
    /// locking the table until the cursor is closed.
    pub fn create_cursor(
        &self,
        column: Option<&str>,
        direction: Direction,
        range: Option<KeyRange<Value>>,
    ) -> Result<Cursor> {
        let mut table = self.borrow_mut();
        table.check_unlocked()?;
        let column = match column {
            Some(column) => column.to_string(),
            None => table.schema().primary_key().to_string(),
        };
        let index = table.index(&column).ok_or_else(|| Error::IndexNotFound {
            table: table.name().to_string(),
            column: column.clone(),
        })?;
        let range = range.unwrap_or(KeyRange::All);
        let span = index.bounds(&range);
        table.set_locked(true);
        drop(table);
        Ok(Cursor::open(self.clone(), column, direction, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::schema::{column, AlterTableBuilder, TableBuilder};

    fn persons() -> TableSchema {
        TableBuilder::new("persons")
            .column(column("id").int64().primary_key())
            .column(column("name").string().indexed())
            .column(column("username").string().unique().nullable())
            .column(column("age").int64().nullable())
            .build()
            .unwrap()
    }

    fn person(id: i64, name: &str, username: Option<&str>) -> Row {
        Row::new()
            .with("id", id)
            .with("name", name)
            .with("username", username)
    }

    fn ids(rows: &[Rc<Row>]) -> Vec<i64> {
        rows.iter().map(|r| r.value("id").as_i64().unwrap()).collect()
    }

    #[test]
    fn test_insert_and_get() {
        let mut table = IndexedTable::new(persons());
        table.insert(person(2, "Bob", None)).unwrap();
        table.insert(person(1, "Alice", Some("al"))).unwrap();

        assert_eq!(table.len(), 2);
        let alice = table.get(&Value::Int64(1)).unwrap();
        assert_eq!(alice.value("name"), &Value::from("Alice"));
        assert_eq!(alice.value("age"), &Value::Null);
        assert_eq!(ids(&table.rows()), vec![1, 2]);
        assert_eq!(table.index_names(), vec!["name".to_string(), "username".to_string()]);
    }

    #[test]
    fn test_insert_validation() {
        let mut table = IndexedTable::new(persons());
        let err = table.insert(Row::new().with("id", 1).with("name", 5)).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let err = table.insert(Row::new().with("id", 1)).unwrap_err();
        assert!(matches!(err, Error::NullConstraint { ref column } if column == "name"));

        let err = table.insert(Row::new().with("name", "x")).unwrap_err();
        assert!(matches!(err, Error::NullConstraint { ref column } if column == "id"));

        let err = table.insert(person(1, "x", None).with("shoe", 9)).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_unique_violation_leaves_table_untouched() {
        let mut table = IndexedTable::new(persons());
        table.insert(person(1, "A", Some("bob"))).unwrap();

        let err = table.insert(person(2, "B", Some("bob"))).unwrap_err();
        assert!(matches!(err, Error::UniqueConstraint { ref column, .. } if column == "username"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.index("name").unwrap().len(), 1);
        assert!(table.index("name").unwrap().get(&Value::from("B")).is_empty());

        let err = table.insert(person(1, "C", None)).unwrap_err();
        assert!(matches!(err, Error::UniqueConstraint { ref column, .. } if column == "id"));
    }

    #[test]
    fn test_insert_all_is_atomic() {
        let mut table = IndexedTable::new(persons());
        let err = table
            .insert_all(vec![person(1, "A", Some("a")), person(2, "B", Some("a"))])
            .unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(table.is_empty());
        assert!(table.index("name").unwrap().is_empty());
    }

    #[test]
    fn test_update_reindexes_and_keeps_pk() {
        let mut table = IndexedTable::new(persons());
        table.insert(person(1, "Zed", None)).unwrap();
        table.insert(person(2, "Amy", None)).unwrap();

        table.update(&Value::Int64(1), &Row::new().with("name", "Abe")).unwrap();
        let names: Vec<&Value> = table
            .index("name")
            .unwrap()
            .iter(Direction::Next)
            .map(|(k, _)| k)
            .collect();
        assert_eq!(names, vec![&Value::from("Abe"), &Value::from("Amy")]);

        let err = table.update(&Value::Int64(1), &Row::new().with("id", 3)).unwrap_err();
        assert!(matches!(err, Error::PrimaryKeyImmutable { .. }));
        assert!(table.get(&Value::Int64(1)).is_some());
        assert!(table.get(&Value::Int64(3)).is_none());
    }

    #[test]
    fn test_update_unique_conflict() {
        let mut table = IndexedTable::new(persons());
        table.insert(person(1, "A", Some("a"))).unwrap();
        table.insert(person(2, "B", Some("b"))).unwrap();

        let err = table
            .update(&Value::Int64(2), &Row::new().with("username", "a").with("name", "Q"))
            .unwrap_err();
        assert!(err.is_constraint_violation());
        let row = table.get(&Value::Int64(2)).unwrap();
        assert_eq!(row.value("name"), &Value::from("B"));
        assert!(table.index("name").unwrap().contains_key(&Value::from("B")));
    }

    #[test]
    fn test_delete_and_delete_all() {
        let mut table = IndexedTable::new(persons());
        table.insert(person(1, "A", None)).unwrap();
        table.insert(person(2, "B", None)).unwrap();

        table.delete(&Value::Int64(1)).unwrap();
        assert!(matches!(table.delete(&Value::Int64(1)), Err(Error::NotFound { .. })));
        assert_eq!(table.index("name").unwrap().len(), 1);

        assert_eq!(table.delete_all().unwrap(), 1);
        assert!(table.is_empty());
        assert!(table.index("id").unwrap().is_empty());
    }

    #[test]
    fn test_create_and_remove_index() {
        let mut table = IndexedTable::new(persons());
        table.insert(person(1, "A", None).with("age", 30)).unwrap();
        table.insert(person(2, "B", None).with("age", 30)).unwrap();

        assert!(table.create_index("age", true).unwrap_err().is_constraint_violation());
        assert!(table.index("age").is_none());

        table.create_index("age", false).unwrap();
        assert_eq!(table.index("age").unwrap().get(&Value::Int64(30)).len(), 2);
        assert!(table.schema().is_indexed("age"));
        assert!(matches!(
            table.create_index("age", false),
            Err(Error::IndexAlreadyExists { .. })
        ));

        table.remove_index("age").unwrap();
        assert!(!table.schema().is_indexed("age"));
        assert!(matches!(table.remove_index("age"), Err(Error::IndexNotFound { .. })));
        assert!(table.remove_index("id").is_err());
    }

    #[test]
    fn test_from_rows_rebuilds_indexes() {
        let table = IndexedTable::from_rows(
            persons(),
            vec![person(3, "C", None), person(1, "A", None), person(2, "B", None)],
        )
        .unwrap();
        assert_eq!(ids(&table.rows()), vec![1, 2, 3]);
        assert!(table.index("name").unwrap().check_order());

        let err = IndexedTable::from_rows(persons(), vec![person(1, "A", None), person(1, "B", None)]);
        assert!(err.is_err());
    }

    #[test]
    fn test_alter_replay() {
        let mut table = IndexedTable::new(persons());
        table.insert(person(1, "A", None).with("age", 40)).unwrap();
        table.insert(person(2, "B", None).with("age", 20)).unwrap();

        let actions = AlterTableBuilder::new("persons")
            .add_column(column("color").string().nullable())
            .rename_column("age", "years")
            .alter_column("years", |c| c.set_indexed(true))
            .drop_column("username")
            .into_actions();
        for action in &actions {
            table.apply_alter(action).unwrap();
        }

        let row = table.get(&Value::Int64(1)).unwrap();
        assert_eq!(row.get("color"), Some(&Value::Null));
        assert_eq!(row.value("years"), &Value::Int64(40));
        assert!(!row.contains("username"));
        assert_eq!(table.index_names(), vec!["name".to_string(), "years".to_string()]);
        let order: Vec<&Value> = table
            .index("years")
            .unwrap()
            .iter(Direction::Next)
            .map(|(_, pk)| pk)
            .collect();
        assert_eq!(order, vec![&Value::Int64(2), &Value::Int64(1)]);
    }

    #[test]
    fn test_alter_rejections_leave_table_intact() {
        let mut table = IndexedTable::new(persons());
        table.insert(person(1, "A", None)).unwrap();

        let add_required = AlterTableBuilder::new("persons")
            .add_column(column("color").string())
            .into_actions();
        assert!(matches!(
            table.apply_alter(&add_required[0]),
            Err(Error::NullConstraint { .. })
        ));

        let retype = AlterTableBuilder::new("persons")
            .alter_column("name", |c| c.set_data_type(tally_core::DataType::Int64))
            .into_actions();
        assert!(matches!(table.apply_alter(&retype[0]), Err(Error::TypeMismatch { .. })));

        let not_null = AlterTableBuilder::new("persons")
            .alter_column("age", |c| c.set_nullable(false))
            .into_actions();
        assert!(matches!(table.apply_alter(&not_null[0]), Err(Error::NullConstraint { .. })));

        assert_eq!(table.schema(), &persons());
        assert_eq!(table.get(&Value::Int64(1)).unwrap().value("name"), &Value::from("A"));
    }

    #[test]
    fn test_locked_table_rejects_direct_writes() {
        let shared = SharedTable::new(IndexedTable::new(persons()));
        shared.borrow_mut().insert(person(1, "A", None)).unwrap();

        let cursor = shared.create_cursor(None, Direction::Next, None).unwrap();
        assert!(matches!(
            shared.borrow_mut().insert(person(2, "B", None)),
            Err(Error::TableLocked { .. })
        ));
        assert!(matches!(
            shared.create_cursor(Some("name"), Direction::Next, None),
            Err(Error::TableLocked { .. })
        ));
        cursor.close().unwrap();
        shared.borrow_mut().insert(person(2, "B", None)).unwrap();
    }
}
