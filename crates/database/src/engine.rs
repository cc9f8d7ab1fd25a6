//! The in-memory engine both adapters share.
//!
//! An [`Engine`] owns at most one open [`Session`] (the database's info and its
//! table cache) and hands out one [`Transaction`] at a time. What differs
//! between adapters is only where sessions come from and where committed state
//! goes, which is the [`Persistence`] seam.

use crate::adapter::{DatabaseInfo, DatabaseState};
use crate::transaction::Transaction;
use std::cell::{Cell, RefCell};
use tally_core::schema::check_naming_rules;
use tally_core::{Error, Result};
use tally_storage::{Changes, Scope, TableCache, Transaction as StorageTransaction, TransactionMode};
use tracing::{debug, info};

/// An open database: its info and live tables.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) info: DatabaseInfo,
    pub(crate) cache: TableCache,
}

impl Session {
    /// A database that has never been migrated.
    pub(crate) fn new(name: &str) -> Self {
        Self {
            info: DatabaseInfo::new(name, 0),
            cache: TableCache::new(),
        }
    }

    /// Every table, as a full rewrite.
    pub(crate) fn all_changes(&self) -> Changes {
        Changes {
            tables: self.cache.table_names().into_iter().collect(),
            schema_changed: true,
        }
    }
}

/// Where sessions are loaded from and committed to.
pub(crate) trait Persistence {
    /// Loads a stored database, `None` if it does not exist.
    fn load(&self, name: &str) -> Result<Option<Session>>;

    /// Makes the listed changes of `session` durable, all or nothing.
    fn save(&self, session: &Session, changes: &Changes) -> Result<()>;

    /// Takes back a session when its database closes.
    fn release(&self, session: Session);

    fn delete(&self, name: &str) -> Result<()>;

    fn info(&self, name: &str) -> Result<Option<DatabaseInfo>>;
}

pub(crate) struct Engine {
    store: Box<dyn Persistence>,
    session: RefCell<Option<Session>>,
    state: Cell<DatabaseState>,
    in_flight: Cell<bool>,
}

impl Engine {
    pub(crate) fn new(store: impl Persistence + 'static) -> Self {
        Self {
            store: Box::new(store),
            session: RefCell::new(None),
            state: Cell::new(DatabaseState::Closed),
            in_flight: Cell::new(false),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> DatabaseState {
        self.state.get()
    }

    #[inline]
    pub(crate) fn in_transaction(&self) -> bool {
        self.in_flight.get()
    }

    fn open_name(&self) -> Option<String> {
        self.session.borrow().as_ref().map(|s| s.info.name.clone())
    }

    /// Opens `name`, returning a version-change transaction when the stored
    /// version is below `version`.
    pub(crate) fn open(&self, name: &str, version: u32) -> Result<Option<Transaction<'_>>> {
        check_naming_rules(name)?;
        if let Some(open) = self.open_name() {
            return Err(Error::invalid_operation(format!(
                "database {} is already open",
                open
            )));
        }
        self.state.set(DatabaseState::Opening);
        let session = match self.store.load(name) {
            Ok(session) => session.unwrap_or_else(|| Session::new(name)),
            Err(err) => {
                self.state.set(DatabaseState::Closed);
                return Err(err);
            }
        };

        let stored = session.info.version;
        if version < stored {
            self.store.release(session);
            self.state.set(DatabaseState::Closed);
            return Err(Error::DatabaseVersionTooLow {
                name: name.to_string(),
                requested: version,
                stored,
            });
        }

        info!(database = name, stored, requested = version, "opening database");
        *self.session.borrow_mut() = Some(session);
        if version == stored {
            self.state.set(DatabaseState::Open);
            return Ok(None);
        }
        self.start(&[], TransactionMode::VersionChange, Some(version))
            .map(Some)
    }

    /// Starts a user transaction. Version-change transactions only come from
    /// [`Engine::open`].
    pub(crate) fn begin(&self, tables: &[&str], mode: TransactionMode) -> Result<Transaction<'_>> {
        if mode == TransactionMode::VersionChange {
            return Err(Error::invalid_operation(
                "version-change transactions are only opened by a migration",
            ));
        }
        if self.state.get() != DatabaseState::Open {
            return Err(Error::DatabaseNotOpen);
        }
        self.start(tables, mode, None)
    }

    fn start(
        &self,
        tables: &[&str],
        mode: TransactionMode,
        target_version: Option<u32>,
    ) -> Result<Transaction<'_>> {
        let session = self.session.borrow();
        let session = session.as_ref().ok_or(Error::DatabaseNotOpen)?;
        if self.in_flight.get() {
            return Err(Error::TransactionAlreadyOpen {
                database: session.info.name.clone(),
            });
        }
        if let Some(missing) = tables.iter().find(|t| !session.cache.has_table(t)) {
            return Err(Error::table_not_found(*missing));
        }

        let scope = if tables.is_empty() {
            Scope::All
        } else {
            Scope::tables(tables.iter().copied())
        };
        let inner = StorageTransaction::begin(&session.cache, mode, scope);
        debug!(
            database = %session.info.name,
            id = inner.id(),
            ?mode,
            tables = tables.len(),
            "transaction started"
        );
        self.in_flight.set(true);
        Ok(Transaction::new(self, inner, target_version))
    }

    /// Runs `f` against the open session.
    pub(crate) fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> Result<R>) -> Result<R> {
        let mut session = self.session.borrow_mut();
        let session = session.as_mut().ok_or(Error::DatabaseNotOpen)?;
        f(session)
    }

    pub(crate) fn persist(&self, changes: &Changes) -> Result<()> {
        let session = self.session.borrow();
        let session = session.as_ref().ok_or(Error::DatabaseNotOpen)?;
        self.store.save(session, changes)
    }

    /// Clears the in-flight flag. A finished version change opens the database.
    pub(crate) fn finish_transaction(&self, upgraded: bool) {
        self.in_flight.set(false);
        if upgraded && self.state.get() == DatabaseState::Opening {
            self.state.set(DatabaseState::Open);
        }
    }

    pub(crate) fn close(&self) -> Result<()> {
        if self.in_flight.get() {
            return Err(Error::invalid_operation(
                "cannot close a database while a transaction is in flight",
            ));
        }
        let Some(session) = self.session.borrow_mut().take() else {
            return Ok(());
        };
        self.state.set(DatabaseState::Closing);
        info!(database = %session.info.name, version = session.info.version, "closing database");
        self.store.release(session);
        self.state.set(DatabaseState::Closed);
        Ok(())
    }

    pub(crate) fn delete(&self, name: &str) -> Result<()> {
        check_naming_rules(name)?;
        if self.open_name().as_deref() == Some(name) {
            self.close()?;
        }
        self.store.delete(name)?;
        info!(database = name, "database deleted");
        Ok(())
    }

    pub(crate) fn info(&self, name: &str) -> Result<Option<DatabaseInfo>> {
        check_naming_rules(name)?;
        if let Some(session) = self.session.borrow().as_ref() {
            if session.info.name == name {
                return Ok(Some(session.info.clone()));
            }
        }
        self.store.info(name)
    }

    pub(crate) fn table_names(&self) -> Result<Vec<String>> {
        self.with_session(|s| Ok(s.cache.table_names()))
    }

    pub(crate) fn table_index_names(&self, table: &str) -> Result<Vec<String>> {
        self.with_session(|s| Ok(s.cache.table(table)?.borrow().index_names()))
    }
}

/// Implements [`crate::DatabaseAdapter`] by delegating to an `engine` field.
macro_rules! delegate_to_engine {
    ($adapter:ty) => {
        impl $crate::adapter::DatabaseAdapter for $adapter {
            fn open_database(
                &self,
                name: &str,
                version: u32,
            ) -> tally_core::Result<Option<$crate::transaction::Transaction<'_>>> {
                self.engine.open(name, version)
            }

            fn close_database(&self) -> tally_core::Result<()> {
                self.engine.close()
            }

            fn delete_database(&self, name: &str) -> tally_core::Result<()> {
                self.engine.delete(name)
            }

            fn open_transaction(
                &self,
                tables: &[&str],
                mode: tally_storage::TransactionMode,
            ) -> tally_core::Result<$crate::transaction::Transaction<'_>> {
                self.engine.begin(tables, mode)
            }

            fn database_info(
                &self,
                name: &str,
            ) -> tally_core::Result<Option<$crate::adapter::DatabaseInfo>> {
                self.engine.info(name)
            }

            fn table_names(&self) -> tally_core::Result<Vec<String>> {
                self.engine.table_names()
            }

            fn table_index_names(&self, table: &str) -> tally_core::Result<Vec<String>> {
                self.engine.table_index_names(table)
            }

            fn state(&self) -> $crate::adapter::DatabaseState {
                self.engine.state()
            }

            fn in_transaction(&self) -> bool {
                self.engine.in_transaction()
            }
        }
    };
}

pub(crate) use delegate_to_engine;
