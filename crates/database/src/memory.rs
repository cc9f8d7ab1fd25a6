//! The in-memory adapter.
//!
//! Databases live for as long as the adapter does. Closing a database parks
//! its tables in the adapter so a later open finds them again.

use crate::adapter::DatabaseInfo;
use crate::engine::{delegate_to_engine, Engine, Persistence, Session};
use std::cell::RefCell;
use std::collections::BTreeMap;
use tally_core::Result;
use tally_storage::Changes;

#[derive(Debug, Default)]
struct MemoryStore {
    databases: RefCell<BTreeMap<String, Session>>,
}

impl Persistence for MemoryStore {
    fn load(&self, name: &str) -> Result<Option<Session>> {
        Ok(self.databases.borrow_mut().remove(name))
    }

    fn save(&self, _session: &Session, _changes: &Changes) -> Result<()> {
        Ok(())
    }

    fn release(&self, session: Session) {
        // Never migrated, nothing to keep
        if session.info.version == 0 && session.cache.table_count() == 0 {
            return;
        }
        self.databases
            .borrow_mut()
            .insert(session.info.name.clone(), session);
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.databases.borrow_mut().remove(name);
        Ok(())
    }

    fn info(&self, name: &str) -> Result<Option<DatabaseInfo>> {
        Ok(self.databases.borrow().get(name).map(|s| s.info.clone()))
    }
}

/// Keeps every database in process memory.
pub struct MemoryAdapter {
    engine: Engine,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self {
            engine: Engine::new(MemoryStore::default()),
        }
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAdapter")
            .field("state", &self.engine.state())
            .finish()
    }
}

delegate_to_engine!(MemoryAdapter);
