//! Core database infrastructure
//!
//! This module provides the foundational database components used throughout beyond:
//! - `DbClient`: the shared single-connection SQLite handle
//! - `SchemaManager`: additive schema synchronization and introspection
//! - `Entity` / `Record`: typed access to entity tables (row counting, batch inserts)

mod connection;
mod query;
mod schema;

pub use connection::DbClient;
pub(crate) use connection::quote_ident;
pub use query::{count, Entity, Filter, Record};
pub use schema::{
    ColumnType, EntityDescriptor, FieldDef, SchemaManager, SchemaRegistry, SchemaStatus,
    CREATED_AT, UPDATED_AT,
};
