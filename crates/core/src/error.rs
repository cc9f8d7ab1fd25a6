//! Error types for the Tally data engine.

use crate::types::DataType;
use crate::value::Value;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error kinds raised by schema, storage, query and adapter operations.
///
/// Integrity violations (uniqueness, primary key, locked table) are always raised
/// before any index is touched, so the table is unchanged when one is returned.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Type mismatch on column {column}: expected {expected}, got {got}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        got: String,
    },

    #[error("Null constraint violation on column: {column}")]
    NullConstraint { column: String },

    #[error("Unique constraint violation on column {column}: {value}")]
    UniqueConstraint { column: String, value: Value },

    #[error("Primary key {column} of table {table} cannot be changed")]
    PrimaryKeyImmutable { table: String, column: String },

    /// An update or delete expected exactly one row and matched none.
    #[error("No row in table {table} matches {filter}")]
    NotFound { table: String, filter: String },

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("Column {column} not found in table {table}")]
    ColumnNotFound { table: String, column: String },

    #[error("Table not found: {name}")]
    TableNotFound { name: String },

    #[error("Table already exists: {name}")]
    TableAlreadyExists { name: String },

    #[error("Index on column {column} already exists in table {table}")]
    IndexAlreadyExists { table: String, column: String },

    #[error("Index on column {column} not found in table {table}")]
    IndexNotFound { table: String, column: String },

    /// A cursor is already open on the table.
    #[error("Table {table} is locked by an open cursor")]
    TableLocked { table: String },

    #[error("A transaction is already open on database {database}")]
    TransactionAlreadyOpen { database: String },

    #[error("Transaction has already been committed or rolled back")]
    TransactionClosed,

    #[error("Cannot write to table {table} in a read-only transaction")]
    ReadOnlyTransaction { table: String },

    #[error("Table {table} is not part of this transaction")]
    TableNotInScope { table: String },

    #[error("Database is not open")]
    DatabaseNotOpen,

    #[error("Database {name} is at version {stored}, cannot open at lower version {requested}")]
    DatabaseVersionTooLow {
        name: String,
        requested: u32,
        stored: u32,
    },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn type_mismatch(column: impl Into<String>, expected: DataType, got: &Value) -> Self {
        Error::TypeMismatch {
            column: column.into(),
            expected,
            got: got
                .data_type()
                .map(|dt| dt.name().to_string())
                .unwrap_or_else(|| "null".to_string()),
        }
    }

    pub fn null_constraint(column: impl Into<String>) -> Self {
        Error::NullConstraint {
            column: column.into(),
        }
    }

    pub fn unique_constraint(column: impl Into<String>, value: Value) -> Self {
        Error::UniqueConstraint {
            column: column.into(),
            value,
        }
    }

    pub fn primary_key_immutable(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::PrimaryKeyImmutable {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn not_found(table: impl Into<String>, filter: impl Into<String>) -> Self {
        Error::NotFound {
            table: table.into(),
            filter: filter.into(),
        }
    }

    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound { name: name.into() }
    }

    pub fn table_locked(table: impl Into<String>) -> Self {
        Error::TableLocked {
            table: table.into(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for the integrity violations a caller may want to surface to a
    /// user rather than treat as a bug.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Error::UniqueConstraint { .. }
                | Error::NullConstraint { .. }
                | Error::PrimaryKeyImmutable { .. }
                | Error::TypeMismatch { .. }
        )
    }
}
