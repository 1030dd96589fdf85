//! Database module
//!
//! This module provides all persistence functionality for beyond, organized into:
//!
//! - **core**: Core database infrastructure (shared handle, schema sync, row counting)
//! - **entities**: The application's tables and the ordered schema registry
//! - **seed**: Idempotent reference-data seeding
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # DbClient: one shared SQLite connection
//! │   ├── schema      # Entity descriptors, registry, additive sync
//! │   └── query       # Entity/Record traits, Filter, count, batch insert
//! │
//! ├── entities/       # Bill, travel, file, tomato and habit tables
//! │
//! ├── seed/           # Ordered seed stages and canonical data
//! │
//! └── beyond          # BeyondDatabase: open → sync → seed → hand out handle
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use beyond::config::RunMode;
//! use beyond::database::{BeyondDatabase, DatabaseConfig, Filter};
//! use beyond::database::entities::BillType;
//!
//! let db = BeyondDatabase::connect(&DatabaseConfig::new("beyond.db", RunMode::Debug))?;
//!
//! // Pass the shared handle to consumers
//! let client = db.client();
//! let categories = client.count::<BillType>(&Filter::all())?;
//! ```

mod beyond;
pub mod core;
pub mod entities;
pub mod seed;

pub use beyond::{BeyondDatabase, DatabaseConfig, TableStatus};

pub use self::core::{
    count, ColumnType, DbClient, Entity, EntityDescriptor, FieldDef, Filter, Record,
    SchemaManager, SchemaRegistry, SchemaStatus,
};

pub use seed::{SeedOutcome, SeedPipeline, SeedReport, SeedStage};
