//! Error types for the persistence layer.
//!
//! Every startup failure is fatal and carries the context (descriptor or
//! dataset name) of the step that failed, with the underlying cause kept as
//! the error source.

use std::io;

/// Failure of a read or write issued through the shared handle.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The shared connection cannot be acquired.
    #[error("database handle unavailable: {0}")]
    Unavailable(String),

    /// The filter expression was rejected before reaching SQLite.
    #[error("invalid filter '{clause}': {reason}")]
    InvalidFilter { clause: String, reason: String },

    /// SQLite rejected or failed the statement.
    #[error("query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Reason a single entity descriptor could not be synchronized.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("descriptor declares no fields")]
    NoFields,

    #[error("field '{field}' has invalid column type '{ty}'")]
    InvalidType { field: String, ty: String },

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl From<rusqlite::Error> for SchemaError {
    fn from(e: rusqlite::Error) -> Self {
        SchemaError::Query(QueryError::Sqlite(e))
    }
}

/// Top-level error of the persistence bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The database file could not be opened or the connection configured.
    #[error("failed to open database '{path}': {source}")]
    Connection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A specific entity's schema could not be created or altered.
    #[error("failed to sync schema for {descriptor}: {source}")]
    SchemaSync {
        descriptor: String,
        #[source]
        source: SchemaError,
    },

    #[error(transparent)]
    Query(#[from] QueryError),

    /// A seed stage failed to check or insert its dataset.
    #[error("failed to seed {dataset}: {source}")]
    Seed {
        dataset: String,
        #[source]
        source: Box<DbError>,
    },

    /// A filesystem read needed to build a canonical dataset failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl DbError {
    /// Name of the descriptor or dataset this error is attributed to, if any.
    pub fn context(&self) -> Option<&str> {
        match self {
            DbError::SchemaSync { descriptor, .. } => Some(descriptor),
            DbError::Seed { dataset, .. } => Some(dataset),
            _ => None,
        }
    }
}
