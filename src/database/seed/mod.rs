//! Idempotent seeding of reference data
//!
//! A [`SeedPipeline`] is an ordered list of [`SeedStage`]s. Each stage checks
//! whether its table already holds rows and, only if it is empty, inserts its
//! canonical row set as one batch. Existing rows are never touched, so edits
//! made by an operator survive restarts.
//!
//! Stages are independent of each other; the first failing stage aborts the
//! rest of the pipeline.

pub mod data;

use crate::database::core::{DbClient, Filter, Record};
use crate::error::{DbError, QueryError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type CheckFn = Box<dyn Fn(&DbClient) -> Result<u64, QueryError> + Send + Sync>;
type InsertFn = Box<dyn Fn(&DbClient) -> Result<usize, DbError> + Send + Sync>;

/// Result of running one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum SeedOutcome {
    /// The table was empty and the canonical rows were inserted
    Inserted { rows: usize },

    /// The table already held rows; nothing was written
    Skipped { existing: u64 },
}

/// One idempotent seeding step: a dataset name, a check, and an insert action
pub struct SeedStage {
    name: String,
    check: CheckFn,
    insert: InsertFn,
}

impl SeedStage {
    /// Build a stage from an explicit check and insert action
    ///
    /// `insert` only runs when `check` returns 0.
    pub fn new<C, I>(name: &str, check: C, insert: I) -> Self
    where
        C: Fn(&DbClient) -> Result<u64, QueryError> + Send + Sync + 'static,
        I: Fn(&DbClient) -> Result<usize, DbError> + Send + Sync + 'static,
    {
        SeedStage {
            name: name.to_string(),
            check: Box::new(check),
            insert: Box::new(insert),
        }
    }

    /// Stage that fills the table of `R` with `rows()` when it is empty
    pub fn canonical<R, F>(name: &str, rows: F) -> Self
    where
        R: Record + 'static,
        F: Fn() -> Result<Vec<R>, DbError> + Send + Sync + 'static,
    {
        Self::new(
            name,
            |client| client.count::<R>(&Filter::all()),
            move |client| Ok(client.insert_batch(&rows()?)?),
        )
    }

    /// Name of the dataset this stage seeds, e.g. `bill type`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the stage against `client`
    ///
    /// Any failure is wrapped in [`DbError::Seed`] naming this dataset.
    pub fn run(&self, client: &DbClient) -> Result<SeedOutcome, DbError> {
        let existing = (self.check)(client).map_err(|e| self.wrap(e.into()))?;
        if existing > 0 {
            debug!("{} already seeded ({} rows)", self.name, existing);
            return Ok(SeedOutcome::Skipped { existing });
        }

        let rows = (self.insert)(client).map_err(|e| self.wrap(e))?;
        info!("seeded {} with {} rows", self.name, rows);
        Ok(SeedOutcome::Inserted { rows })
    }

    fn wrap(&self, source: DbError) -> DbError {
        DbError::Seed {
            dataset: self.name.clone(),
            source: Box::new(source),
        }
    }
}

impl std::fmt::Debug for SeedStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedStage")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Report entry for one executed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub dataset: String,
    pub outcome: SeedOutcome,
}

/// Ordered sequence of seed stages
#[derive(Debug, Default)]
pub struct SeedPipeline {
    stages: Vec<SeedStage>,
}

impl SeedPipeline {
    /// An empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// The application's standard pipeline
    ///
    /// Seeds bill categories, the default ledger, reference areas, and, when
    /// `file_dir` is given, the index of files already in the upload directory.
    pub fn standard(file_dir: Option<&Path>) -> Self {
        let pipeline = SeedPipeline::new()
            .stage(SeedStage::canonical("bill type", || Ok(data::bill_types())))
            .stage(SeedStage::canonical("bill ledger", || {
                Ok(data::bill_ledgers())
            }))
            .stage(SeedStage::canonical("area", || Ok(data::areas())));

        match file_dir {
            Some(dir) => {
                let dir: PathBuf = dir.to_path_buf();
                pipeline.stage(SeedStage::canonical("file", move || data::file_index(&dir)))
            }
            None => pipeline,
        }
    }

    /// Append a stage; stages run in insertion order
    pub fn stage(mut self, stage: SeedStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Dataset names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(SeedStage::name).collect()
    }

    /// Run every stage in order, stopping at the first failure
    pub fn run(&self, client: &DbClient) -> Result<Vec<SeedReport>, DbError> {
        let mut reports = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let outcome = stage.run(client)?;
            reports.push(SeedReport {
                dataset: stage.name().to_string(),
                outcome,
            });
        }
        Ok(reports)
    }
}
