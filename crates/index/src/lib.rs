//! Tally Index - sorted bucket index for the Tally data engine.
//!
//! - `SortedIndex`: a strictly sorted array of key buckets, each bucket holding
//!   the primary keys of the rows that share the key
//! - `KeyRange`: inclusive/exclusive bounds used to restrict scans
//! - `Direction`: ascending (`Next`) or descending (`Prev`) traversal
//!
//! # Example
//!
//! ```rust
//! use tally_index::{Direction, KeyRange, SortedIndex};
//!
//! let mut index: SortedIndex<i32, u64> = SortedIndex::new(false);
//! index.add(20, 2).unwrap();
//! index.add(10, 1).unwrap();
//! index.add(20, 3).unwrap();
//!
//! assert_eq!(index.get(&20), &[2, 3]);
//!
//! let range = KeyRange::lower_bound(15, false);
//! let pks: Vec<u64> = index.scan(&range, Direction::Prev).map(|(_, pk)| *pk).collect();
//! assert_eq!(pks, vec![2, 3]);
//! ```

#![no_std]

extern crate alloc;

mod direction;
mod range;
mod sorted;

pub use direction::Direction;
pub use range::KeyRange;
pub use sorted::{IndexEntry, IndexError, SortedIndex};
