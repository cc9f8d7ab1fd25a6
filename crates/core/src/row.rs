//! Row structure for the Tally data engine.
//!
//! A row is an open-ended mapping from column name to value. Columns that were never
//! set read as `Null`.

use crate::value::Value;
use std::collections::BTreeMap;

static NULL: Value = Value::Null;

/// A row in a table, or a partial row used as an update payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Gets the value of a column, `None` if the column was never set.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Gets the value of a column, reading absent columns as `Null`.
    pub fn value(&self, column: &str) -> &Value {
        self.values.get(column).unwrap_or(&NULL)
    }

    /// Sets a column value, returning the previous one.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(column.into(), value.into())
    }

    /// Removes a column from the row.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.values.remove(column)
    }

    /// Returns true if the column is present.
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Iterates columns in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the column names present in this row.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    /// Copies every column of `partial` onto this row, returning the columns whose
    /// value actually changed together with their previous value.
    pub fn merge(&mut self, partial: &Row) -> Vec<(String, Value)> {
        let mut changed = Vec::new();
        for (column, value) in partial.iter() {
            let old = self.value(column).clone();
            if &old != value || !self.contains(column) {
                self.values.insert(column.to_string(), value.clone());
                if &old != value {
                    changed.push((column.to_string(), old));
                }
            }
        }
        changed
    }

    /// Returns the number of columns present.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
