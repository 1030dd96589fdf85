//! Beyond database bootstrap
//!
//! [`BeyondDatabase::connect`] is the single startup entry point: it opens the
//! shared handle, synchronizes the schema, seeds reference data, and only then
//! hands the handle back. A failure at any step drops the connection, so no
//! partially initialized handle ever reaches the rest of the application.

use crate::config::RunMode;
use crate::database::core::{
    DbClient, Entity, Filter, SchemaManager, SchemaRegistry, SchemaStatus,
};
use crate::database::entities;
use crate::database::seed::{SeedPipeline, SeedReport};
use crate::error::{DbError, QueryError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Storage location and run mode for [`BeyondDatabase::connect`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,

    /// In debug mode every statement is logged
    pub mode: RunMode,

    /// Upload directory indexed into the file table on first start
    pub file_dir: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>, mode: RunMode) -> Self {
        DatabaseConfig {
            path: path.into(),
            mode,
            file_dir: None,
        }
    }

    pub fn with_file_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.file_dir = Some(dir.into());
        self
    }
}

/// Schema and row count of one registered table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub entity: String,
    pub table: String,
    pub schema: SchemaStatus,
    /// `None` when the table does not exist
    pub rows: Option<u64>,
}

/// Fully initialized application database
///
/// Holding a `BeyondDatabase` guarantees the schema is synchronized and the
/// reference data is seeded. Call [`BeyondDatabase::connect`] exactly once at
/// startup and pass [`BeyondDatabase::client`] to every consumer.
#[derive(Debug, Clone)]
pub struct BeyondDatabase {
    client: DbClient,
    seeded: Vec<SeedReport>,
}

impl BeyondDatabase {
    /// Open, synchronize, and seed the application database
    pub fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let pipeline = SeedPipeline::standard(config.file_dir.as_deref());
        Self::connect_with(config, &entities::registry(), &pipeline)
    }

    /// [`BeyondDatabase::connect`] with an explicit registry and seed pipeline
    pub fn connect_with(
        config: &DatabaseConfig,
        registry: &SchemaRegistry,
        pipeline: &SeedPipeline,
    ) -> Result<Self, DbError> {
        let client = DbClient::open(&config.path)?;
        Self::bootstrap(client, config.mode, registry, pipeline).inspect_err(|e| {
            error!("database startup failed for {}: {}", config.path.display(), e);
        })
    }

    /// Create an in-memory database with the standard schema and seed data (for testing)
    pub fn open_in_memory() -> Result<Self, DbError> {
        let client = DbClient::open_in_memory()?;
        Self::bootstrap(
            client,
            RunMode::Release,
            &entities::registry(),
            &SeedPipeline::standard(None),
        )
    }

    fn bootstrap(
        client: DbClient,
        mode: RunMode,
        registry: &SchemaRegistry,
        pipeline: &SeedPipeline,
    ) -> Result<Self, DbError> {
        info!(
            "synchronizing {} tables in {}",
            registry.len(),
            client.path()
        );
        client.with_conn(|conn| SchemaManager::new(conn).sync(registry))?;

        if mode.is_debug() {
            client.enable_statement_log()?;
        }

        let seeded = pipeline.run(&client)?;
        info!("database ready at {}", client.path());
        Ok(BeyondDatabase { client, seeded })
    }

    /// The shared handle
    pub fn client(&self) -> DbClient {
        self.client.clone()
    }

    /// Outcome of each seed stage run during startup
    pub fn seed_reports(&self) -> &[SeedReport] {
        &self.seeded
    }

    /// Path the database was opened with
    pub fn path(&self) -> &Path {
        Path::new(self.client.path())
    }

    /// Count rows of `E` matching `filter`
    pub fn count<E: Entity>(&self, filter: &Filter) -> Result<u64, QueryError> {
        self.client.count::<E>(filter)
    }

    /// Schema status and row count for every table in `registry`
    pub fn status(&self, registry: &SchemaRegistry) -> Result<Vec<TableStatus>, QueryError> {
        let schemas = self.client.with_conn(|conn| {
            let manager = SchemaManager::new(conn);
            registry
                .iter()
                .map(|d| Ok((d, manager.status(d)?)))
                .collect::<Result<Vec<_>, QueryError>>()
        })?;

        schemas
            .into_iter()
            .map(|(descriptor, schema)| {
                let rows = match schema {
                    SchemaStatus::Missing => None,
                    _ => Some(self.client.table_count(descriptor.table)?),
                };
                Ok(TableStatus {
                    entity: descriptor.name.to_string(),
                    table: descriptor.table.to_string(),
                    schema,
                    rows,
                })
            })
            .collect()
    }
}
