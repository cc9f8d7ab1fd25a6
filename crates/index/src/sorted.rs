//! Sorted bucket index.
//!
//! A [`SortedIndex`] keeps one [`IndexEntry`] per distinct key in a vector that
//! is strictly sorted by key. Each entry holds the primary keys of the rows that
//! carry that key, in insertion order. Empty buckets are pruned as soon as their
//! last primary key is removed, so positions in the vector always address a
//! non-empty bucket.
//!
//! Uniqueness is checked before any mutation: a failed `add` or `update` leaves
//! the index exactly as it was.

use crate::direction::Direction;
use crate::range::KeyRange;
use alloc::vec::Vec;
use core::ops::Range;

/// Error type for index operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexError {
    /// Attempted to insert a duplicate key in a unique index.
    DuplicateKey,
    /// Key not found.
    KeyNotFound,
}

impl core::fmt::Display for IndexError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IndexError::DuplicateKey => write!(f, "Duplicate key in unique index"),
            IndexError::KeyNotFound => write!(f, "Key not found"),
        }
    }
}

/// One distinct key and the primary keys of the rows that carry it.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry<K, P> {
    key: K,
    primary_keys: Vec<P>,
}

impl<K, P> IndexEntry<K, P> {
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn primary_keys(&self) -> &[P] {
        &self.primary_keys
    }
}

/// An index over `K` keys mapping to `P` primary keys.
#[derive(Clone, Debug)]
pub struct SortedIndex<K, P> {
    entries: Vec<IndexEntry<K, P>>,
    unique: bool,
    len: usize,
}

impl<K: Ord + Clone, P: PartialEq + Clone> SortedIndex<K, P> {
    /// Creates an empty index.
    pub fn new(unique: bool) -> Self {
        Self {
            entries: Vec::new(),
            unique,
            len: 0,
        }
    }

    /// Builds an index from `(key, primary key)` pairs in one pass.
    ///
    /// Pairs are sorted by key; pairs sharing a key keep their input order
    /// inside the bucket.
    pub fn build<I>(pairs: I, unique: bool) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (K, P)>,
    {
        let mut pairs: Vec<(K, P)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut index = Self::new(unique);
        index.len = pairs.len();
        for (key, pk) in pairs {
            match index.entries.last_mut() {
                Some(last) if last.key == key => {
                    if unique {
                        return Err(IndexError::DuplicateKey);
                    }
                    last.primary_keys.push(pk);
                }
                _ => index.entries.push(IndexEntry {
                    key,
                    primary_keys: alloc::vec![pk],
                }),
            }
        }
        Ok(index)
    }

    /// Returns whether this is a unique index.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Changes the uniqueness flag. Fails without mutating when a bucket already
    /// holds more than one primary key.
    pub fn set_unique(&mut self, unique: bool) -> Result<(), IndexError> {
        if unique && self.entries.iter().any(|e| e.primary_keys.len() > 1) {
            return Err(IndexError::DuplicateKey);
        }
        self.unique = unique;
        Ok(())
    }

    /// Returns the number of primary keys stored across all buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of distinct keys.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn entries(&self) -> &[IndexEntry<K, P>] {
        &self.entries
    }

    /// Returns the bucket at `position`, if any.
    #[inline]
    pub fn entry(&self, position: usize) -> Option<&IndexEntry<K, P>> {
        self.entries.get(position)
    }

    /// Binary search for `key`: `Ok(position)` when the bucket exists, otherwise
    /// `Err(insertion point)`.
    pub fn find(&self, key: &K) -> Result<usize, usize> {
        self.entries.binary_search_by(|entry| entry.key.cmp(key))
    }

    /// Returns the primary keys stored under `key`.
    pub fn get(&self, key: &K) -> &[P] {
        match self.find(key) {
            Ok(pos) => &self.entries[pos].primary_keys,
            Err(_) => &[],
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_ok()
    }

    /// Checks whether `key` could be added without breaking uniqueness.
    pub fn check_add(&self, key: &K) -> Result<(), IndexError> {
        if self.unique && self.contains_key(key) {
            return Err(IndexError::DuplicateKey);
        }
        Ok(())
    }

    /// Adds `pk` under `key`, creating the bucket at its sorted position.
    pub fn add(&mut self, key: K, pk: P) -> Result<(), IndexError> {
        match self.find(&key) {
            Ok(pos) => {
                if self.unique {
                    return Err(IndexError::DuplicateKey);
                }
                self.entries[pos].primary_keys.push(pk);
            }
            Err(pos) => self.entries.insert(
                pos,
                IndexEntry {
                    key,
                    primary_keys: alloc::vec![pk],
                },
            ),
        }
        self.len += 1;
        Ok(())
    }

    /// Removes `pk` from the bucket for `key`, pruning the bucket if it empties.
    /// Returns false if the pair was not present.
    pub fn remove(&mut self, key: &K, pk: &P) -> bool {
        let Ok(pos) = self.find(key) else {
            return false;
        };
        let bucket = &mut self.entries[pos].primary_keys;
        let Some(sub) = bucket.iter().position(|p| p == pk) else {
            return false;
        };
        bucket.remove(sub);
        if bucket.is_empty() {
            self.entries.remove(pos);
        }
        self.len -= 1;
        true
    }

    /// Moves `pk` from the `old` bucket to the `new` one.
    ///
    /// Fails without mutating when `new` would break uniqueness or when the
    /// `(old, pk)` pair is not present.
    pub fn update(&mut self, old: &K, new: K, pk: P) -> Result<(), IndexError> {
        if *old == new {
            return if self.get(old).contains(&pk) {
                Ok(())
            } else {
                Err(IndexError::KeyNotFound)
            };
        }
        self.check_add(&new)?;
        if !self.remove(old, &pk) {
            return Err(IndexError::KeyNotFound);
        }
        self.add(new, pk)
    }

    /// Clears all entries from the index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.len = 0;
    }

    /// Returns the half-open span of bucket positions whose keys fall inside
    /// `range`. The span is empty when nothing matches.
    pub fn bounds(&self, range: &KeyRange<K>) -> Range<usize> {
        let start = match range.lower() {
            None => 0,
            Some((lower, true)) => self.entries.partition_point(|e| e.key <= *lower),
            Some((lower, false)) => self.entries.partition_point(|e| e.key < *lower),
        };
        let end = match range.upper() {
            None => self.entries.len(),
            Some((upper, true)) => self.entries.partition_point(|e| e.key < *upper),
            Some((upper, false)) => self.entries.partition_point(|e| e.key <= *upper),
        };
        start..end.max(start)
    }

    /// Iterates `(key, primary key)` pairs inside `range` in the given direction.
    /// Primary keys within a bucket are always yielded in insertion order.
    pub fn scan<'a>(
        &'a self,
        range: &KeyRange<K>,
        direction: Direction,
    ) -> impl Iterator<Item = (&'a K, &'a P)> + 'a {
        let span = &self.entries[self.bounds(range)];
        let buckets: alloc::boxed::Box<dyn Iterator<Item = &'a IndexEntry<K, P>> + 'a> =
            match direction {
                Direction::Next => alloc::boxed::Box::new(span.iter()),
                Direction::Prev => alloc::boxed::Box::new(span.iter().rev()),
            };
        buckets.flat_map(|entry| entry.primary_keys.iter().map(move |pk| (&entry.key, pk)))
    }

    /// Iterates every `(key, primary key)` pair in the given direction.
    pub fn iter(&self, direction: Direction) -> impl Iterator<Item = (&K, &P)> + '_ {
        self.scan(&KeyRange::All, direction)
    }

    /// Verifies the structural invariants: keys strictly ascending, no empty
    /// bucket, single-entry buckets when unique, and a consistent length.
    pub fn check_order(&self) -> bool {
        let sorted = self.entries.windows(2).all(|w| w[0].key < w[1].key);
        let buckets_ok = self.entries.iter().all(|e| {
            !e.primary_keys.is_empty() && (!self.unique || e.primary_keys.len() == 1)
        });
        let counted: usize = self.entries.iter().map(|e| e.primary_keys.len()).sum();
        sorted && buckets_ok && counted == self.len
    }
}
