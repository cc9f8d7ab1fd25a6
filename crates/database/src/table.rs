//! Table handles.
//!
//! A [`Table`] names one table inside a [`Transaction`]. Every call resolves
//! the table again through the transaction, so scope and mode checks apply to
//! each operation and a handle never outlives its transaction.

use crate::transaction::Transaction;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use tally_core::schema::{AlterTableBuilder, TableSchema};
use tally_core::{Error, Result, Row, Value};
use tally_index::{Direction, KeyRange};
use tally_query::ast::WhereNode;
use tally_query::context::TablePlanContext;
use tally_query::executor::{self, HashJoin};
use tally_query::planner::{self, FindOptions, OrderBy, QueryPlan};
use tally_storage::{Cursor, TransactionMode};

pub struct Table<'t> {
    tx: &'t Transaction<'t>,
    name: String,
}

fn filter_text(filter: Option<&WhereNode>) -> String {
    filter.map_or_else(|| "*".to_string(), |f| f.to_string())
}

impl<'t> Table<'t> {
    pub(crate) fn new(tx: &'t Transaction<'t>, name: &str) -> Self {
        Self {
            tx,
            name: name.to_string(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Result<TableSchema> {
        Ok(self.tx.read_table(&self.name)?.borrow().schema().clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.tx.read_table(&self.name)?.borrow().len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Secondary index names, sorted. The primary key is not listed.
    pub fn index_names(&self) -> Result<Vec<String>> {
        Ok(self.tx.read_table(&self.name)?.borrow().index_names())
    }

    /// Returns the first row matching `filter` in the requested order.
    pub fn find_first(
        &self,
        filter: Option<WhereNode>,
        order_by: Option<OrderBy>,
    ) -> Result<Option<Rc<Row>>> {
        let options = FindOptions {
            filter,
            order_by,
            limit: Some(1),
            ..FindOptions::default()
        };
        Ok(self.find_many(&options)?.into_iter().next())
    }

    pub fn find_many(&self, options: &FindOptions) -> Result<Vec<Rc<Row>>> {
        let table = self.tx.read_table(&self.name)?;
        executor::find(&table, options)
    }

    /// Returns the plan `find_many` would run for `options`.
    pub fn explain(&self, options: &FindOptions) -> Result<QueryPlan> {
        let table = self.tx.read_table(&self.name)?;
        let ctx = TablePlanContext::from_table(&table.borrow());
        planner::plan(&ctx, options)
    }

    pub fn count(&self, filter: Option<&WhereNode>) -> Result<usize> {
        let table = self.tx.read_table(&self.name)?;
        executor::count(&table, filter)
    }

    pub fn insert(&self, row: Row) -> Result<Rc<Row>> {
        let table = self.tx.write_table(&self.name)?;
        let inserted = table.borrow_mut().insert(row)?;
        Ok(inserted)
    }

    /// Inserts every row or none of them.
    pub fn insert_many(&self, rows: impl IntoIterator<Item = Row>) -> Result<Vec<Rc<Row>>> {
        let table = self.tx.write_table(&self.name)?;
        let inserted = table.borrow_mut().insert_all(rows)?;
        Ok(inserted)
    }

    /// Merges `partial` into every matching row, returning the updated rows.
    pub fn update(&self, filter: Option<&WhereNode>, partial: &Row) -> Result<Vec<Rc<Row>>> {
        let table = self.tx.write_table(&self.name)?;
        executor::update_where(&table, filter, partial, None)
    }

    /// Updates the first matching row in primary key order.
    pub fn update_one(&self, filter: Option<&WhereNode>, partial: &Row) -> Result<Rc<Row>> {
        let table = self.tx.write_table(&self.name)?;
        executor::update_where(&table, filter, partial, Some(1))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(&self.name, filter_text(filter)))
    }

    /// Deletes every matching row, returning how many were deleted.
    pub fn delete(&self, filter: Option<&WhereNode>) -> Result<usize> {
        let table = self.tx.write_table(&self.name)?;
        executor::delete_where(&table, filter, None)
    }

    /// Deletes the first matching row in primary key order.
    pub fn delete_one(&self, filter: Option<&WhereNode>) -> Result<()> {
        let table = self.tx.write_table(&self.name)?;
        match executor::delete_where(&table, filter, Some(1))? {
            0 => Err(Error::not_found(&self.name, filter_text(filter))),
            _ => Ok(()),
        }
    }

    /// Opens a cursor over the index on `column` (the primary key when
    /// `None`). Updates and deletes through it are part of this transaction,
    /// so it needs a writable one.
    pub fn cursor(
        &self,
        column: Option<&str>,
        direction: Direction,
        range: Option<KeyRange<Value>>,
    ) -> Result<TableCursor<'t>> {
        let table = self.tx.write_table(&self.name)?;
        Ok(TableCursor {
            inner: table.create_cursor(column, direction, range)?,
            _tx: PhantomData,
        })
    }

    pub fn delete_all(&self) -> Result<usize> {
        let table = self.tx.write_table(&self.name)?;
        let deleted = table.borrow_mut().delete_all()?;
        Ok(deleted)
    }

    /// Left outer join of this table with `other` on `left = right`.
    ///
    /// Output columns are qualified as `table.column`. Left rows without a
    /// match keep only their own columns.
    pub fn left_join(&self, other: &Table<'_>, on: (&str, &str)) -> Result<JoinedTable> {
        let (left_column, right_column) = on;
        let left = self.tx.read_table(&self.name)?;
        let right = other.tx.read_table(&other.name)?;
        let left = left.borrow();
        let right = right.borrow();
        left.schema().column(left_column)?;
        right.schema().column(right_column)?;

        let join = HashJoin::left_outer(&self.name, left_column, &other.name, right_column);
        Ok(JoinedTable {
            rows: join.execute(&left.rows(), &right.rows()),
        })
    }

    fn require_upgrade(&self, operation: &str) -> Result<()> {
        if self.tx.mode() != TransactionMode::VersionChange {
            return Err(Error::invalid_operation(format!(
                "{} on {} is only allowed while upgrading",
                operation, self.name
            )));
        }
        Ok(())
    }

    /// Applies `builder`'s actions to this table. The builder's own table
    /// name is ignored. Only allowed while upgrading.
    pub fn alter(&self, builder: AlterTableBuilder) -> Result<()> {
        self.require_upgrade("alter")?;
        self.tx.alter(&self.name, builder.actions())
    }

    /// Builds an index over `column`. Only allowed while upgrading.
    pub fn create_index(&self, column: &str, unique: bool) -> Result<()> {
        self.require_upgrade("create_index")?;
        let table = self.tx.write_table(&self.name)?;
        let created = table.borrow_mut().create_index(column, unique);
        created
    }

    /// Drops the index over `column`. Only allowed while upgrading.
    pub fn remove_index(&self, column: &str) -> Result<()> {
        self.require_upgrade("remove_index")?;
        let table = self.tx.write_table(&self.name)?;
        let removed = table.borrow_mut().remove_index(column);
        removed
    }
}

impl std::fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}

/// A cursor opened through a [`Table`].
///
/// It borrows the transaction, so it is closed (or dropped) before the
/// transaction commits or rolls back:
///
/// ```compile_fail
/// use tally_core::schema::{column, TableBuilder};
/// use tally_database::{Database, MemoryAdapter, TransactionMode};
/// use tally_index::Direction;
///
/// let mut db = Database::new(MemoryAdapter::new());
/// db.open("app", 1, |tx, _, _| {
///     tx.create_table(TableBuilder::new("t").column(column("id").int64().primary_key()).build()?)?;
///     Ok(())
/// })
/// .unwrap();
/// let tx = db.transaction(&["t"], TransactionMode::ReadWrite).unwrap();
/// let cursor = tx.table("t").unwrap().cursor(None, Direction::Next, None).unwrap();
/// tx.commit().unwrap();
/// cursor.close().unwrap();
/// ```
#[derive(Debug)]
pub struct TableCursor<'t> {
    inner: Cursor,
    _tx: PhantomData<&'t Transaction<'t>>,
}

impl TableCursor<'_> {
    /// Applies the queued changes and unlocks the table.
    pub fn close(self) -> Result<()> {
        self.inner.close()
    }
}

impl Deref for TableCursor<'_> {
    type Target = Cursor;

    fn deref(&self) -> &Cursor {
        &self.inner
    }
}

impl DerefMut for TableCursor<'_> {
    fn deref_mut(&mut self) -> &mut Cursor {
        &mut self.inner
    }
}

/// The materialized output of a join.
#[derive(Clone, Debug, Default)]
pub struct JoinedTable {
    rows: Vec<Rc<Row>>,
}

impl JoinedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Rc<Row>] {
        &self.rows
    }

    /// Filters, orders and pages the joined rows. Columns are addressed by
    /// their qualified names.
    pub fn find_many(&self, options: &FindOptions) -> Vec<Rc<Row>> {
        executor::find_in(self.rows.clone(), options)
    }
}
