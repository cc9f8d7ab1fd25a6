//! Filesystem adapter configuration.

use std::env;
use std::path::{Path, PathBuf};
use tally_core::schema::check_naming_rules;
use tally_core::Result;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "TALLY_DATA_DIR";
/// Environment variable enabling pretty-printed JSON files.
pub const PRETTY_JSON_ENV: &str = "TALLY_PRETTY_JSON";
/// Data directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Where and how the filesystem adapter stores databases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilesystemConfig {
    root: PathBuf,
    pretty: bool,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_DATA_DIR),
            pretty: false,
        }
    }
}

impl FilesystemConfig {
    /// Creates a config rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pretty: false,
        }
    }

    /// Reads `TALLY_DATA_DIR` and `TALLY_PRETTY_JSON`, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let root = env::var_os(DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let pretty = env::var(PRETTY_JSON_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self { root, pretty }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn pretty(&self) -> bool {
        self.pretty
    }

    /// Directory holding one database. The name follows the table naming
    /// rules, so it never leaves the root.
    pub fn database_dir(&self, name: &str) -> Result<PathBuf> {
        check_naming_rules(name)?;
        Ok(self.root.join(name))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
