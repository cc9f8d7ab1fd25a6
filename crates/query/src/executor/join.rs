//! Hash Join implementation.

use core::hash::{Hash, Hasher};
use hashbrown::HashMap;
use std::rc::Rc;
use tally_core::{Row, Value};

/// A wrapper around Value reference that implements Hash and Eq for use as HashMap key.
#[derive(Clone, Copy)]
struct ValueRef<'a>(&'a Value);

impl<'a> Hash for ValueRef<'a> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<'a> PartialEq for ValueRef<'a> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<'a> Eq for ValueRef<'a> {}

/// Left outer equi-join of two tables.
///
/// Output rows carry every column qualified as `table.column`. A left row
/// without a match appears once with no right-side columns; `Null` keys never
/// match.
///
/// 1. Build phase: hash the right rows by their join key
/// 2. Probe phase: scan the left rows in order and look up their key
#[derive(Clone, Debug)]
pub struct HashJoin {
    left_table: String,
    left_column: String,
    right_table: String,
    right_column: String,
}

impl HashJoin {
    pub fn left_outer(
        left_table: impl Into<String>,
        left_column: impl Into<String>,
        right_table: impl Into<String>,
        right_column: impl Into<String>,
    ) -> Self {
        Self {
            left_table: left_table.into(),
            left_column: left_column.into(),
            right_table: right_table.into(),
            right_column: right_column.into(),
        }
    }

    fn qualify(table: &str, row: &Row, out: &mut Row) {
        for (column, value) in row.iter() {
            out.set(format!("{}.{}", table, column), value.clone());
        }
    }

    /// Executes the join, preserving left order and, per left row, right order.
    pub fn execute(&self, left: &[Rc<Row>], right: &[Rc<Row>]) -> Vec<Rc<Row>> {
        let mut hash_table: HashMap<ValueRef<'_>, Vec<u32>> = HashMap::with_capacity(right.len());
        for (idx, row) in right.iter().enumerate() {
            let key = row.value(&self.right_column);
            if !key.is_null() {
                hash_table.entry(ValueRef(key)).or_default().push(idx as u32);
            }
        }

        let mut result = Vec::with_capacity(left.len());
        for left_row in left {
            let key = left_row.value(&self.left_column);
            let matches = if key.is_null() {
                None
            } else {
                hash_table.get(&ValueRef(key))
            };
            match matches {
                Some(indices) => {
                    for &idx in indices {
                        let mut joined = Row::new();
                        Self::qualify(&self.left_table, left_row, &mut joined);
                        Self::qualify(&self.right_table, &right[idx as usize], &mut joined);
                        result.push(Rc::new(joined));
                    }
                }
                None => {
                    let mut joined = Row::new();
                    Self::qualify(&self.left_table, left_row, &mut joined);
                    result.push(Rc::new(joined));
                }
            }
        }
        result
    }
}
