#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Beyond - persistence bootstrap for a personal tracking application
//!
//! Beyond keeps a finance ledger, a habit tracker, a travel log and a task
//! timer in one SQLite file. This crate owns the startup of that storage:
//!
//! 1. open a single shared connection (SQLite is single-writer, so the
//!    handle wraps exactly one physical connection),
//! 2. synchronize the on-disk schema with the registered entity descriptors,
//!    additively and in a fixed order,
//! 3. seed mandatory reference data exactly once, however often the
//!    application restarts.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none)  | Library: connection, schema sync, seeding | `rusqlite`, `config` |
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | The `beyond` binary | All above + `clap`, `tracing-subscriber` |
//!
//! # Architecture
//!
//! - **[`database`]**: connection handle, schema registry, row counting,
//!   seed pipeline, and the [`BeyondDatabase`] startup entry point
//! - **[`config`]**: configuration file and environment loading
//! - **[`error`]**: typed errors for every startup and query failure
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use beyond::{BeyondConfig, BeyondDatabase};
//! use beyond::database::{entities::BillLedger, Filter};
//!
//! let config = BeyondConfig::new(&None)?;
//! config.ensure_dirs()?;
//!
//! // Connect exactly once at startup; fails without handing out a handle
//! // if the schema cannot be synced or seeding fails.
//! let db = BeyondDatabase::connect(&config.database_config())?;
//!
//! let defaults = Filter::expr("is_default = ?").bind(true);
//! assert_eq!(db.count::<BillLedger>(&defaults)?, 1);
//! ```

pub mod config;
pub mod database;
pub mod error;

// =============================================================================
// Configuration
// =============================================================================

pub use config::{BeyondConfig, RunMode};

// =============================================================================
// Database
// =============================================================================

pub use database::{BeyondDatabase, DatabaseConfig, DbClient, Filter};

// =============================================================================
// Errors
// =============================================================================

pub use error::{DbError, QueryError, SchemaError};
