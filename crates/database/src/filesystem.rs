//! The filesystem adapter.
//!
//! Each database is a directory under the configured root:
//!
//! ```text
//! <root>/<database>/meta.json     name, version and every table schema
//! <root>/<database>/<table>.json  the table's rows as a JSON array
//! ```
//!
//! A commit writes each affected file to a `.tmp` sibling and renames it into
//! place. Files are backed up to `.bak` siblings first, so a failed commit
//! leaves the directory as it was before.

use crate::adapter::DatabaseInfo;
use crate::config::FilesystemConfig;
use crate::convert::{json_to_rows, rows_to_json};
use crate::engine::{delegate_to_engine, Engine, Persistence, Session};
use crate::transaction::RESERVED_TABLE_NAME;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tally_core::schema::TableSchema;
use tally_core::Result;
use tally_storage::{Changes, IndexedTable, TableCache};
use tracing::{debug, error, info};

const META_FILE: &str = RESERVED_TABLE_NAME;
const JSON_EXT: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct Meta {
    name: String,
    version: u32,
    tables: Vec<TableSchema>,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn json_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(stem).with_extension(JSON_EXT)
}

/// Files touched by one commit, so they can be put back if it fails.
#[derive(Debug, Default)]
struct FileBatch {
    backups: Vec<(PathBuf, PathBuf)>,
    created: Vec<PathBuf>,
}

impl FileBatch {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if path.exists() {
            let backup = sibling(path, ".bak");
            fs::copy(path, &backup)?;
            self.backups.push((path.to_path_buf(), backup));
        } else {
            self.created.push(path.to_path_buf());
        }
        let tmp = sibling(path, ".tmp");
        if let Err(err) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path)) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> io::Result<()> {
        let backup = sibling(path, ".bak");
        fs::rename(path, &backup)?;
        self.backups.push((path.to_path_buf(), backup));
        Ok(())
    }

    fn restore(self) {
        for path in &self.created {
            let _ = fs::remove_file(path);
        }
        for (path, backup) in self.backups.iter().rev() {
            if let Err(err) = fs::rename(backup, path) {
                error!(path = %path.display(), error = %err, "restoring backup failed");
            }
        }
    }

    fn discard(self) {
        for (_, backup) in &self.backups {
            let _ = fs::remove_file(backup);
        }
    }
}

#[derive(Debug)]
struct FileStore {
    config: FilesystemConfig,
}

impl FileStore {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let bytes = if self.config.pretty() {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(bytes)
    }

    fn read_meta(&self, dir: &Path) -> Result<Option<Meta>> {
        let path = json_path(dir, META_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn load_table(&self, dir: &Path, schema: TableSchema) -> Result<IndexedTable> {
        let path = json_path(dir, schema.name());
        if !path.exists() {
            return Ok(IndexedTable::new(schema));
        }
        let json: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
        let rows = json_to_rows(&schema, &json)?;
        IndexedTable::from_rows(schema, rows)
    }

    /// Table files left behind by tables that no longer exist.
    fn stale_files(&self, dir: &Path, cache: &TableCache) -> Result<Vec<PathBuf>> {
        let mut stale = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(JSON_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem != META_FILE && !cache.has_table(stem) {
                stale.push(path);
            }
        }
        Ok(stale)
    }

    fn plan_writes(&self, dir: &Path, session: &Session, changes: &Changes) -> Result<Vec<(PathBuf, Vec<u8>)>> {
        let mut writes = Vec::new();
        for name in &changes.tables {
            if let Some(table) = session.cache.get_table(name) {
                let json = rows_to_json(&table.borrow().rows());
                writes.push((json_path(dir, name), self.encode(&json)?));
            }
        }
        if changes.schema_changed || !json_path(dir, META_FILE).exists() {
            let meta = Meta {
                name: session.info.name.clone(),
                version: session.info.version,
                tables: session.cache.schemas(),
            };
            writes.push((json_path(dir, META_FILE), self.encode(&meta)?));
        }
        Ok(writes)
    }
}

impl Persistence for FileStore {
    fn load(&self, name: &str) -> Result<Option<Session>> {
        let dir = self.config.database_dir(name)?;
        let Some(meta) = self.read_meta(&dir)? else {
            return Ok(None);
        };
        let mut cache = TableCache::new();
        for schema in meta.tables {
            schema.validate()?;
            cache.insert_table(self.load_table(&dir, schema)?)?;
        }
        debug!(database = name, version = meta.version, tables = cache.table_count(), "database loaded");
        Ok(Some(Session {
            info: DatabaseInfo::new(meta.name, meta.version),
            cache,
        }))
    }

    fn save(&self, session: &Session, changes: &Changes) -> Result<()> {
        let dir = self.config.database_dir(&session.info.name)?;
        fs::create_dir_all(&dir)?;
        let writes = self.plan_writes(&dir, session, changes)?;
        let stale = if changes.schema_changed {
            self.stale_files(&dir, &session.cache)?
        } else {
            Vec::new()
        };

        let mut batch = FileBatch::default();
        let applied = writes
            .iter()
            .try_for_each(|(path, bytes)| batch.write(path, bytes))
            .and_then(|_| stale.iter().try_for_each(|path| batch.remove(path)));
        match applied {
            Ok(()) => {
                batch.discard();
                debug!(
                    database = %session.info.name,
                    files = writes.len(),
                    removed = stale.len(),
                    "commit persisted"
                );
                Ok(())
            }
            Err(err) => {
                error!(database = %session.info.name, error = %err, "persisting commit failed, restoring files");
                batch.restore();
                Err(err.into())
            }
        }
    }

    fn release(&self, _session: Session) {}

    fn delete(&self, name: &str) -> Result<()> {
        let dir = self.config.database_dir(name)?;
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    fn info(&self, name: &str) -> Result<Option<DatabaseInfo>> {
        let meta = self.read_meta(&self.config.database_dir(name)?)?;
        Ok(meta.map(|m| DatabaseInfo::new(m.name, m.version)))
    }
}

/// Stores every database as JSON files under a root directory.
pub struct FilesystemAdapter {
    engine: Engine,
    config: FilesystemConfig,
}

impl FilesystemAdapter {
    pub fn new(config: FilesystemConfig) -> Self {
        info!(root = %config.root().display(), pretty = config.pretty(), "filesystem adapter ready");
        Self {
            engine: Engine::new(FileStore {
                config: config.clone(),
            }),
            config,
        }
    }

    /// Builds an adapter from `TALLY_DATA_DIR` and `TALLY_PRETTY_JSON`.
    pub fn from_env() -> Self {
        Self::new(FilesystemConfig::from_env())
    }

    pub fn config(&self) -> &FilesystemConfig {
        &self.config
    }
}

impl std::fmt::Debug for FilesystemAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemAdapter")
            .field("config", &self.config)
            .field("state", &self.engine.state())
            .finish()
    }
}

delegate_to_engine!(FilesystemAdapter);
