//! Key ranges used to bound index scans.

/// A key range for index scans.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyRange<K> {
    /// All keys
    All,
    /// A single key (equality)
    Only(K),
    /// Keys >= lower bound (or > when exclusive)
    LowerBound { value: K, exclusive: bool },
    /// Keys <= upper bound (or < when exclusive)
    UpperBound { value: K, exclusive: bool },
    /// Keys between lower and upper bounds
    Bound {
        lower: K,
        upper: K,
        lower_exclusive: bool,
        upper_exclusive: bool,
    },
}

impl<K: Ord> KeyRange<K> {
    pub fn all() -> Self {
        KeyRange::All
    }

    pub fn only(key: K) -> Self {
        KeyRange::Only(key)
    }

    pub fn lower_bound(value: K, exclusive: bool) -> Self {
        KeyRange::LowerBound { value, exclusive }
    }

    pub fn upper_bound(value: K, exclusive: bool) -> Self {
        KeyRange::UpperBound { value, exclusive }
    }

    pub fn bound(lower: K, upper: K, lower_exclusive: bool, upper_exclusive: bool) -> Self {
        KeyRange::Bound {
            lower,
            upper,
            lower_exclusive,
            upper_exclusive,
        }
    }

    /// Returns true if this range represents a single value (equality).
    pub fn is_only(&self) -> bool {
        matches!(self, KeyRange::Only(_))
    }

    /// Returns true if this range represents all values (unbounded).
    pub fn is_all(&self) -> bool {
        matches!(self, KeyRange::All)
    }

    /// Lower edge of the range: the key and whether it is exclusive.
    pub fn lower(&self) -> Option<(&K, bool)> {
        match self {
            KeyRange::All | KeyRange::UpperBound { .. } => None,
            KeyRange::Only(k) => Some((k, false)),
            KeyRange::LowerBound { value, exclusive } => Some((value, *exclusive)),
            KeyRange::Bound {
                lower,
                lower_exclusive,
                ..
            } => Some((lower, *lower_exclusive)),
        }
    }

    /// Upper edge of the range: the key and whether it is exclusive.
    pub fn upper(&self) -> Option<(&K, bool)> {
        match self {
            KeyRange::All | KeyRange::LowerBound { .. } => None,
            KeyRange::Only(k) => Some((k, false)),
            KeyRange::UpperBound { value, exclusive } => Some((value, *exclusive)),
            KeyRange::Bound {
                upper,
                upper_exclusive,
                ..
            } => Some((upper, *upper_exclusive)),
        }
    }

    /// Checks if a key is within this range.
    pub fn contains(&self, key: &K) -> bool {
        let lower_ok = match self.lower() {
            None => true,
            Some((lower, true)) => key > lower,
            Some((lower, false)) => key >= lower,
        };
        let upper_ok = match self.upper() {
            None => true,
            Some((upper, true)) => key < upper,
            Some((upper, false)) => key <= upper,
        };
        lower_ok && upper_ok
    }
}
