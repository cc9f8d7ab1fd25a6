//! Filter executor.

use crate::eval::Predicate;
use std::rc::Rc;
use tally_core::Row;

/// Filter executor - keeps the rows a predicate accepts.
pub struct FilterExecutor<P: Predicate> {
    predicate: P,
}

impl<P: Predicate> FilterExecutor<P> {
    /// Creates a new filter executor.
    pub fn new(predicate: P) -> Self {
        Self { predicate }
    }

    /// Executes the filter, preserving input order.
    pub fn execute(&self, input: Vec<Rc<Row>>) -> Vec<Rc<Row>> {
        input.into_iter().filter(|row| self.predicate.eval(row)).collect()
    }
}
