//! Row counting and batch inserts over entity types

use crate::database::core::connection::{quote_ident, DbClient};
use crate::database::core::schema::EntityDescriptor;
use crate::error::QueryError;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, ToSql};

/// A type backed by a table in the shared database
pub trait Entity {
    const DESCRIPTOR: EntityDescriptor;

    fn table() -> &'static str {
        Self::DESCRIPTOR.table
    }
}

/// An entity whose values can be inserted
///
/// `COLUMNS` lists the inserted columns; `params` yields the values in the
/// same order. Columns with database defaults (id, timestamps) are omitted.
pub trait Record: Entity {
    const COLUMNS: &'static [&'static str];

    fn params(&self) -> Vec<&dyn ToSql>;
}

/// Row filter for [`DbClient::count`]
///
/// An empty filter matches every row. Otherwise the clause is a SQL boolean
/// expression with positional `?` placeholders; values are always bound, never
/// interpolated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clause: Option<String>,
    params: Vec<Value>,
}

impl Filter {
    /// Match every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Match rows satisfying `clause`; a blank clause matches every row
    pub fn expr(clause: impl Into<String>) -> Self {
        let clause = clause.into();
        let clause = (!clause.trim().is_empty()).then_some(clause);
        Filter {
            clause,
            params: vec![],
        }
    }

    /// Bind the next positional parameter
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clause.is_none()
    }

    fn where_sql(&self) -> String {
        match &self.clause {
            Some(clause) => format!(" WHERE {}", clause),
            None => String::new(),
        }
    }

    fn invalid(&self, reason: String) -> QueryError {
        QueryError::InvalidFilter {
            clause: self.clause.clone().unwrap_or_default(),
            reason,
        }
    }
}

impl DbClient {
    /// Count rows of `E` matching `filter`
    ///
    /// Returns 0 for an empty table.
    pub fn count<E: Entity>(&self, filter: &Filter) -> Result<u64, QueryError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            quote_ident(E::table()),
            filter.where_sql()
        );
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(|e| match e {
                rusqlite::Error::MultipleStatement => {
                    filter.invalid("multiple statements are not allowed".to_string())
                }
                e => QueryError::from(e),
            })?;

            let expected = stmt.parameter_count();
            if expected != filter.params.len() {
                return Err(filter.invalid(format!(
                    "expected {} bound values, got {}",
                    expected,
                    filter.params.len()
                )));
            }

            let count: u64 =
                stmt.query_row(params_from_iter(filter.params.iter()), |row| row.get(0))?;
            Ok(count)
        })
    }

    /// Insert `rows` as one batch inside a single transaction
    ///
    /// Either every row is inserted or none is. Returns the number of rows
    /// inserted; an empty batch is a no-op.
    pub fn insert_batch<R: Record>(&self, rows: &[R]) -> Result<usize, QueryError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let columns = R::COLUMNS
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=R::COLUMNS.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(R::table()),
            columns,
            placeholders
        );

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare_cached(&sql)?;
                for row in rows {
                    stmt.execute(row.params().as_slice())?;
                }
            } // stmt is dropped here

            tx.commit()?;
            Ok(rows.len())
        })
    }
}

/// Count rows of `E` matching `filter` on `client`
pub fn count<E: Entity>(client: &DbClient, filter: &Filter) -> Result<u64, QueryError> {
    client.count::<E>(filter)
}
