//! Database schema management
//!
//! Tables are described by static [`EntityDescriptor`]s collected in an ordered
//! [`SchemaRegistry`]. [`SchemaManager`] reconciles the on-disk structure with
//! the registry additively: missing tables and columns are created, nothing is
//! ever dropped or narrowed.

use crate::database::core::connection::quote_ident;
use crate::error::{DbError, QueryError, SchemaError};
use rusqlite::{Connection, ErrorCode};
use serde::Serialize;
use tracing::{debug, info, warn};

/// SQLite column type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
    /// Stored as INTEGER 0/1
    Boolean,
    /// Stored as DATETIME text
    Timestamp,
    /// A raw SQLite type name, validated at sync time
    Custom(&'static str),
}

impl ColumnType {
    /// SQL type name for this column, or `None` if a custom name is malformed
    pub fn sql(&self) -> Option<&'static str> {
        match self {
            ColumnType::Integer | ColumnType::Boolean => Some("INTEGER"),
            ColumnType::Real => Some("REAL"),
            ColumnType::Text => Some("TEXT"),
            ColumnType::Blob => Some("BLOB"),
            ColumnType::Timestamp => Some("DATETIME"),
            ColumnType::Custom(name) => {
                let valid = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                    && name.chars().all(|c| {
                        c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '(' | ')' | ',')
                    });
                valid.then_some(*name)
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ColumnType::Custom(name) => name,
            _ => self.sql().unwrap_or_default(),
        }
    }
}

/// Definition of one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub autoincrement: bool,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<&'static str>,
}

impl FieldDef {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        FieldDef {
            name,
            ty,
            primary_key: false,
            autoincrement: false,
            not_null: false,
            unique: false,
            default: None,
        }
    }

    /// `INTEGER PRIMARY KEY AUTOINCREMENT` id column
    pub const fn id() -> Self {
        let mut field = FieldDef::new("id", ColumnType::Integer);
        field.primary_key = true;
        field.autoincrement = true;
        field
    }

    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Default value expression, inserted verbatim into the DDL
    pub const fn default(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self
    }

    /// Column definition as used in CREATE TABLE
    fn column_sql(&self) -> Result<String, SchemaError> {
        self.render(self.not_null, self.default)
    }

    /// Column definition for ADD COLUMN on a table that may already hold rows
    ///
    /// SQLite only accepts a constant default there, and NOT NULL only together
    /// with one. A non-constant default is dropped from the DDL and returned as
    /// the expression existing rows are backfilled with; NOT NULL without a
    /// constant default is relaxed.
    fn added_column_sql(&self) -> Result<(String, Option<&'static str>), SchemaError> {
        let constant = self.default.filter(|d| is_constant_default(d));
        let backfill = self.default.filter(|d| !is_constant_default(d));
        let sql = self.render(self.not_null && constant.is_some(), constant)?;
        Ok((sql, backfill))
    }

    fn render(&self, not_null: bool, default: Option<&str>) -> Result<String, SchemaError> {
        let ty = self.ty.sql().ok_or_else(|| SchemaError::InvalidType {
            field: self.name.to_string(),
            ty: self.ty.name().to_string(),
        })?;

        let mut sql = format!("{} {}", quote_ident(self.name), ty);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
            if self.autoincrement {
                sql.push_str(" AUTOINCREMENT");
            }
        }
        if not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        Ok(sql)
    }
}

/// Whether `expr` is a literal SQLite accepts as an ADD COLUMN default
fn is_constant_default(expr: &str) -> bool {
    let expr = expr.trim();
    let quoted = expr.len() >= 2 && expr.starts_with('\'') && expr.ends_with('\'');
    quoted
        || expr.parse::<f64>().is_ok()
        || ["NULL", "TRUE", "FALSE"]
            .iter()
            .any(|k| expr.eq_ignore_ascii_case(k))
}

/// Common bookkeeping columns carried by every entity table
pub const CREATED_AT: FieldDef =
    FieldDef::new("created_at", ColumnType::Timestamp).default("CURRENT_TIMESTAMP");
pub const UPDATED_AT: FieldDef =
    FieldDef::new("updated_at", ColumnType::Timestamp).default("CURRENT_TIMESTAMP");

/// Static definition of a persisted table's shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Entity name used in logs and errors, e.g. `BillType`
    pub name: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldDef],
}

impl EntityDescriptor {
    /// SQL for creating the table; validates every field
    pub fn create_table_sql(&self) -> Result<String, SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields);
        }
        let columns = self
            .fields
            .iter()
            .map(FieldDef::column_sql)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            quote_ident(self.table),
            columns.join(",\n    ")
        ))
    }

    /// SQL for the unique indexes of this table, keyed by column name
    pub fn unique_index_sql(&self) -> Vec<(&'static str, String)> {
        self.fields
            .iter()
            .filter(|f| f.unique)
            .map(|f| {
                let sql = format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {}({})",
                    quote_ident(&format!("idx_{}_{}", self.table, f.name)),
                    quote_ident(self.table),
                    quote_ident(f.name)
                );
                (f.name, sql)
            })
            .collect()
    }
}

/// Ordered list of entity descriptors known to the application
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: Vec<EntityDescriptor>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor; sync follows insertion order
    pub fn with(mut self, descriptor: EntityDescriptor) -> Self {
        self.entities.push(descriptor);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<EntityDescriptor> for SchemaRegistry {
    fn from_iter<I: IntoIterator<Item = EntityDescriptor>>(iter: I) -> Self {
        SchemaRegistry {
            entities: iter.into_iter().collect(),
        }
    }
}

/// Structural state of one table relative to its descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SchemaStatus {
    /// Table does not exist yet
    Missing,

    /// Table has every declared column
    Current,

    /// Table exists but lacks some declared columns
    Drifted { missing_columns: Vec<String> },
}

/// Schema manager for the shared database
///
/// Handles additive synchronization and introspection.
pub struct SchemaManager<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaManager<'a> {
    /// Create a new schema manager for the given connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Synchronize every descriptor, in registry order
    ///
    /// Foreign key enforcement is turned off for the duration and restored
    /// afterwards. Stops at the first descriptor that fails; later
    /// descriptors are left untouched.
    pub fn sync(&self, registry: &SchemaRegistry) -> Result<(), DbError> {
        let foreign_keys: bool = self
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .map_err(QueryError::from)?;
        self.set_foreign_keys(false)?;

        let result = registry.iter().try_for_each(|descriptor| {
            self.sync_entity(descriptor)
                .map_err(|source| DbError::SchemaSync {
                    descriptor: descriptor.name.to_string(),
                    source,
                })
        });

        self.set_foreign_keys(foreign_keys)?;
        result
    }

    /// Create the table for `descriptor` or add its missing columns
    pub fn sync_entity(&self, descriptor: &EntityDescriptor) -> Result<(), SchemaError> {
        let create_sql = descriptor.create_table_sql()?;

        if !self.table_exists(descriptor.table)? {
            info!("creating table {} for {}", descriptor.table, descriptor.name);
            self.conn.execute(&create_sql, [])?;
        } else {
            let existing = self.columns(descriptor.table)?;
            for field in descriptor.fields {
                if existing.iter().any(|c| c.eq_ignore_ascii_case(field.name)) {
                    continue;
                }
                info!("adding column {}.{}", descriptor.table, field.name);
                let (column_sql, backfill) = field.added_column_sql()?;
                let table = quote_ident(descriptor.table);
                self.conn.execute(
                    &format!("ALTER TABLE {} ADD COLUMN {}", table, column_sql),
                    [],
                )?;

                if let Some(expr) = backfill {
                    let column = quote_ident(field.name);
                    let filled = self.conn.execute(
                        &format!(
                            "UPDATE {} SET {} = {} WHERE {} IS NULL",
                            table, column, expr, column
                        ),
                        [],
                    )?;
                    debug!(
                        "backfilled {}.{} on {} rows",
                        descriptor.table, field.name, filled
                    );
                }
            }
        }

        for (field, index_sql) in descriptor.unique_index_sql() {
            match self.conn.execute(&index_sql, []) {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, msg))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    warn!(
                        "skipping unique index on {}.{}: existing rows are not unique ({})",
                        descriptor.table,
                        field,
                        msg.unwrap_or_default()
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!("schema for {} is in sync", descriptor.name);
        Ok(())
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> Result<bool, QueryError> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Column names of `table_name`, in declaration order
    pub fn columns(&self, table_name: &str) -> Result<Vec<String>, QueryError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table_name)))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Compare the table backing `descriptor` against its declared fields
    pub fn status(&self, descriptor: &EntityDescriptor) -> Result<SchemaStatus, QueryError> {
        if !self.table_exists(descriptor.table)? {
            return Ok(SchemaStatus::Missing);
        }

        let existing = self.columns(descriptor.table)?;
        let missing_columns: Vec<String> = descriptor
            .fields
            .iter()
            .filter(|f| !existing.iter().any(|c| c.eq_ignore_ascii_case(f.name)))
            .map(|f| f.name.to_string())
            .collect();

        if missing_columns.is_empty() {
            Ok(SchemaStatus::Current)
        } else {
            Ok(SchemaStatus::Drifted { missing_columns })
        }
    }

    fn set_foreign_keys(&self, enabled: bool) -> Result<(), QueryError> {
        let sql = if enabled {
            "PRAGMA foreign_keys=ON"
        } else {
            "PRAGMA foreign_keys=OFF"
        };
        self.conn.execute(sql, [])?;
        Ok(())
    }
}
