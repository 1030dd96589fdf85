//! Database connection management
//!
//! This module provides the shared handle used throughout beyond. SQLite only
//! allows one writer at a time, so the handle wraps exactly one physical
//! connection: a pool of size one. Clones share that connection and every
//! operation issued through any clone is serialized on it.

use crate::error::{DbError, QueryError};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Shared database handle
///
/// `DbClient` is cheap to clone; all clones refer to the same connection.
/// It is created once at startup by [`crate::database::BeyondDatabase`] and
/// handed to every consumer that needs storage access.
#[derive(Clone)]
pub struct DbClient {
    conn: Arc<Mutex<Connection>>,
    path: Arc<str>,
}

impl std::fmt::Debug for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbClient").field("path", &self.path).finish()
    }
}

impl DbClient {
    /// Open the database file at `path` with shared-cache semantics
    ///
    /// The file is created if it does not exist. The parent directory must
    /// already exist.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let display = path.to_string_lossy().to_string();
        let uri = shared_cache_uri(&display);
        debug!("opening sqlite database {}", uri);

        let conn = Connection::open(&uri).map_err(|source| DbError::Connection {
            path: display.clone(),
            source,
        })?;
        Self::from_connection(conn, display)
    }

    /// Create an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(|source| DbError::Connection {
            path: ":memory:".to_string(),
            source,
        })?;
        Self::from_connection(conn, ":memory:".to_string())
    }

    fn from_connection(conn: Connection, path: String) -> Result<Self, DbError> {
        configure(&conn).map_err(|source| DbError::Connection {
            path: path.clone(),
            source,
        })?;
        Ok(DbClient {
            conn: Arc::new(Mutex::new(conn)),
            path: Arc::from(path),
        })
    }

    /// Path the handle was opened with (`:memory:` for in-memory databases)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run `f` against the single underlying connection
    ///
    /// Blocks until the connection is free.
    pub fn with_conn<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<QueryError>,
    {
        let guard = self.lock()?;
        f(&*guard)
    }

    /// Log every statement issued on this handle at info level
    ///
    /// Statements are emitted under the `beyond::sql` target.
    pub fn enable_statement_log(&self) -> Result<(), QueryError> {
        let mut guard = self.lock()?;
        #[allow(deprecated)]
        guard.trace(Some(log_statement));
        info!("sql statement logging enabled for {}", self.path);
        Ok(())
    }

    /// Get the row count for a table by name
    pub fn table_count(&self, table_name: &str) -> Result<u64, QueryError> {
        let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table_name));
        self.with_conn(|conn| Ok(conn.query_row(&query, [], |row| row.get(0))?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, QueryError> {
        self.conn
            .lock()
            .map_err(|_| QueryError::Unavailable("connection lock poisoned".to_string()))
    }
}

/// Apply connection-level settings
fn configure(conn: &Connection) -> rusqlite::Result<()> {
    // WAL keeps readers from blocking on the writer
    let _: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    conn.execute("PRAGMA synchronous=NORMAL", [])?;
    conn.execute("PRAGMA temp_store=MEMORY", [])?;
    conn.execute("PRAGMA foreign_keys=ON", [])?;
    Ok(())
}

fn log_statement(sql: &str) {
    info!(target: "beyond::sql", "{}", sql.trim());
}

/// Build a `file:` URI with the shared-cache hint for `path`
fn shared_cache_uri(path: &str) -> String {
    let escaped = path
        .replace('%', "%25")
        .replace('?', "%3f")
        .replace('#', "%23");
    format!("file:{}?cache=shared", escaped)
}

/// Quote an identifier for interpolation into SQL
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
