//! Deferred-mutation cursor over one table index.
//!
//! A cursor works in three phases:
//!
//! 1. open: [`SharedTable::create_cursor`] locks the table and fixes the span of
//!    index buckets to visit.
//! 2. iterate: [`Cursor::update`] rewrites the row copy immediately and queues the
//!    matching index moves; [`Cursor::delete`] queues the primary key. Indexes are
//!    never touched, so bucket positions stay valid for the whole walk.
//! 3. close: [`Cursor::close`] applies queued index moves in order, then queued
//!    deletes, then unlocks the table.
//!
//! [`SharedTable::create_cursor`]: crate::SharedTable::create_cursor

use crate::table::{IndexedTable, SharedTable};
use std::ops::Range;
use std::rc::Rc;
use tally_core::{Error, Result, Row, Value};
use tally_index::Direction;

/// A deferred index move recorded by [`Cursor::update`].
#[derive(Clone, Debug, PartialEq)]
pub struct IndexUpdate {
    pub pk: Value,
    pub column: String,
    pub old: Value,
    pub new: Value,
}

/// Walks one index of a locked table.
#[derive(Debug)]
pub struct Cursor {
    table: SharedTable,
    column: String,
    direction: Direction,
    span: Range<usize>,
    /// Current bucket; `None` once the walk left the span.
    position: Option<usize>,
    sub_position: usize,
    update_queue: Vec<IndexUpdate>,
    delete_queue: Vec<Value>,
    closed: bool,
}

impl Cursor {
    pub(crate) fn open(
        table: SharedTable,
        column: String,
        direction: Direction,
        span: Range<usize>,
    ) -> Self {
        let position = if span.is_empty() {
            None
        } else {
            match direction {
                Direction::Next => Some(span.start),
                Direction::Prev => Some(span.end - 1),
            }
        };
        Self {
            table,
            column,
            direction,
            span,
            position,
            sub_position: 0,
            update_queue: Vec::new(),
            delete_queue: Vec::new(),
            closed: false,
        }
    }

    /// Returns the indexed column this cursor walks.
    #[inline]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the queued index moves in enqueue order.
    pub fn pending_updates(&self) -> &[IndexUpdate] {
        &self.update_queue
    }

    /// Returns the primary keys queued for deletion.
    pub fn pending_deletes(&self) -> &[Value] {
        &self.delete_queue
    }

    /// Primary key under the cursor, or `None` past the end.
    pub fn primary_key(&self) -> Option<Value> {
        let position = self.position?;
        let table = self.table.borrow();
        table
            .index(&self.column)?
            .entry(position)?
            .primary_keys()
            .get(self.sub_position)
            .cloned()
    }

    /// Row under the cursor, or `None` past the end. Reflects updates made
    /// through this cursor.
    pub fn value(&self) -> Option<Rc<Row>> {
        let pk = self.primary_key()?;
        self.table.borrow().get(&pk)
    }

    /// Moves to the next primary key in the current bucket, or to the next
    /// bucket in the cursor's direction. Returns false once past the end.
    pub fn advance(&mut self) -> bool {
        let Some(position) = self.position else {
            return false;
        };
        let bucket_len = self
            .table
            .borrow()
            .index(&self.column)
            .and_then(|index| index.entry(position))
            .map_or(0, |entry| entry.primary_keys().len());

        if self.sub_position + 1 < bucket_len {
            self.sub_position += 1;
            return true;
        }
        self.sub_position = 0;
        self.position = match self.direction {
            Direction::Next if position + 1 < self.span.end => Some(position + 1),
            Direction::Prev if position > self.span.start => Some(position - 1),
            _ => None,
        };
        self.position.is_some()
    }

    /// Merges `partial` into the current row right away and queues an index move
    /// for every changed indexed column.
    ///
    /// Uniqueness is checked against the index as it will look after the queued
    /// moves; on any error the row is left unchanged.
    pub fn update(&mut self, partial: &Row) -> Result<Rc<Row>> {
        let pk = self
            .primary_key()
            .ok_or_else(|| Error::invalid_operation("Cursor is past the end"))?;
        let (next, queued) = {
            let table = self.table.borrow();
            let current = table
                .get(&pk)
                .ok_or_else(|| Error::not_found(table.name(), pk.to_string()))?;
            table.check_primary_key(&current, partial)?;
            let partial = table.prepare_partial(partial)?;

            let mut next = (*current).clone();
            let changed = next.merge(&partial);

            let mut queued = Vec::new();
            for (column, old) in changed {
                if table.index(&column).is_none() {
                    continue;
                }
                let new = next.value(&column).clone();
                if table.is_unique(&column) && !new.is_null() && self.is_held(&table, &column, &new, &pk)
                {
                    return Err(Error::unique_constraint(column, new));
                }
                queued.push(IndexUpdate {
                    pk: pk.clone(),
                    column,
                    old,
                    new,
                });
            }
            (Rc::new(next), queued)
        };

        self.table.borrow_mut().replace_row(pk, Rc::clone(&next));
        self.update_queue.extend(queued);
        Ok(next)
    }

    /// Returns true if some row other than `pk` holds `key` on `column` once the
    /// queued moves are applied.
    fn is_held(&self, table: &IndexedTable, column: &str, key: &Value, pk: &Value) -> bool {
        let latest = |holder: &Value| {
            self.update_queue
                .iter()
                .rev()
                .find(|u| u.column == column && &u.pk == holder)
                .map(|u| &u.new)
        };
        let in_index = table.index(column).map_or(false, |index| {
            index
                .get(key)
                .iter()
                .any(|holder| holder != pk && latest(holder).map_or(true, |v| v == key))
        });
        in_index
            || self
                .update_queue
                .iter()
                .any(|u| u.column == column && &u.pk != pk && latest(&u.pk) == Some(key))
    }

    /// Queues the current row for deletion. The row stays visible until close.
    pub fn delete(&mut self) -> Result<()> {
        let pk = self
            .primary_key()
            .ok_or_else(|| Error::invalid_operation("Cursor is past the end"))?;
        if !self.delete_queue.contains(&pk) {
            self.delete_queue.push(pk);
        }
        Ok(())
    }

    /// Applies the queued index moves, then the queued deletes, and unlocks the
    /// table.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut table = self.table.borrow_mut();
        let mut result = Ok(());
        for update in self.update_queue.drain(..) {
            if let Err(e) =
                table.update_row_column_indexing(&update.pk, &update.column, &update.old, &update.new)
            {
                result = Err(e);
                break;
            }
        }
        if result.is_ok() {
            for pk in self.delete_queue.drain(..) {
                table.remove_row(&pk);
            }
        }
        table.set_locked(false);
        result
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let table = self.table.borrow().name().to_string();
        tracing::warn!(
            table = %table,
            pending_updates = self.update_queue.len(),
            pending_deletes = self.delete_queue.len(),
            "cursor dropped without close; flushing queued mutations"
        );
        if let Err(error) = self.flush() {
            tracing::error!(table = %table, %error, "failed to flush dropped cursor");
        }
    }
}
