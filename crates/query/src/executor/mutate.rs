//! Filtered updates and deletes.
//!
//! Both walk the primary key with a cursor. Changes are queued on the cursor
//! and applied to the indexes when it closes, so the walk itself never sees
//! its own writes.

use crate::ast::WhereNode;
use crate::eval::Predicate;
use std::rc::Rc;
use tally_core::{Result, Row};
use tally_index::Direction;
use tally_storage::{Cursor, SharedTable};

fn walk<F>(cursor: &mut Cursor, filter: Option<&WhereNode>, limit: Option<usize>, mut visit: F) -> Result<usize>
where
    F: FnMut(&mut Cursor) -> Result<()>,
{
    let mut touched = 0;
    while let Some(row) = cursor.value() {
        if limit.map_or(false, |l| touched >= l) {
            break;
        }
        if filter.eval(&row) {
            visit(cursor)?;
            touched += 1;
        }
        cursor.advance();
    }
    Ok(touched)
}

/// Merges `partial` into every row matching `filter`, at most `limit` rows,
/// returning the updated rows in primary key order.
///
/// All or nothing: when any row fails (a unique conflict with an earlier
/// row of the same update, say) the table is put back as it was.
pub fn update_where(
    table: &SharedTable,
    filter: Option<&WhereNode>,
    partial: &Row,
    limit: Option<usize>,
) -> Result<Vec<Rc<Row>>> {
    table.borrow().prepare_partial(partial)?;
    // Rows are shared, so this copies the row map and index vectors only
    let before = table.borrow().clone();
    let mut cursor = table.create_cursor(None, Direction::Next, None)?;
    let mut updated = Vec::new();
    let walked = walk(&mut cursor, filter, limit, |c| {
        updated.push(c.update(partial)?);
        Ok(())
    });
    let result = cursor.close().and(walked);
    if let Err(err) = result {
        table.replace(before);
        return Err(err);
    }
    Ok(updated)
}

/// Deletes every row matching `filter`, at most `limit` rows, returning how
/// many were deleted.
pub fn delete_where(table: &SharedTable, filter: Option<&WhereNode>, limit: Option<usize>) -> Result<usize> {
    let mut cursor = table.create_cursor(None, Direction::Next, None)?;
    let walked = walk(&mut cursor, filter, limit, |c| c.delete());
    let closed = cursor.close();
    let deleted = walked?;
    closed?;
    Ok(deleted)
}
