use std::process::exit;

use anyhow::Result;
use beyond::database::{entities, BeyondDatabase, SchemaStatus, SeedOutcome, TableStatus};
use beyond::BeyondConfig;
use clap::{Parser, Subcommand};
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{error, Level};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.beyond/beyond.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output as JSON
    #[clap(long)]
    json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the database, sync the schema and seed reference data
    Init,

    /// Show schema state and row counts of every table
    Status,

    /// Show the effective configuration
    Config,
}

#[derive(Tabled)]
struct StatusRow {
    entity: String,
    table: String,
    schema: String,
    rows: String,
}

impl From<&TableStatus> for StatusRow {
    fn from(status: &TableStatus) -> Self {
        let schema = match &status.schema {
            SchemaStatus::Missing => "missing".to_string(),
            SchemaStatus::Current => "current".to_string(),
            SchemaStatus::Drifted { missing_columns } => {
                format!("drifted ({})", missing_columns.join(", "))
            }
        };
        StatusRow {
            entity: status.entity.clone(),
            table: status.table.clone(),
            schema,
            rows: status
                .rows
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn connect(config: &BeyondConfig) -> Result<BeyondDatabase> {
    config.ensure_dirs()?;
    Ok(BeyondDatabase::connect(&config.database_config())?)
}

fn run_init(config: &BeyondConfig, json: bool) -> Result<()> {
    let db = connect(config)?;
    if json {
        let val = json!({
            "path": db.path(),
            "seeded": db.seed_reports(),
        });
        println!("{}", serde_json::to_string_pretty(&val)?);
        return Ok(());
    }

    println!("database ready at {}", db.path().display());
    for report in db.seed_reports() {
        match report.outcome {
            SeedOutcome::Inserted { rows } => {
                println!("  {:<12} seeded {} rows", report.dataset, rows)
            }
            SeedOutcome::Skipped { existing } => {
                println!("  {:<12} kept {} existing rows", report.dataset, existing)
            }
        }
    }
    Ok(())
}

fn run_status(config: &BeyondConfig, json: bool) -> Result<()> {
    let db = connect(config)?;
    let status = db.status(&entities::registry())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let rows: Vec<StatusRow> = status.iter().map(StatusRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn run_config(config: &BeyondConfig, json: bool) -> Result<()> {
    if json {
        let val = json!({
            "data_dir": config.data_dir,
            "db_path": config.db_path,
            "mode": config.mode,
            "file_dir": config.file_dir,
        });
        println!("{}", serde_json::to_string_pretty(&val)?);
    } else {
        println!("{}", config.summary());
    }
    Ok(())
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match BeyondConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: unable to load configuration: {}", e);
            exit(1);
        }
    };

    let level = if cli.debug || config.mode.is_debug() {
        Level::INFO
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        // filter spans/events with level TRACE or higher.
        .with_max_level(level)
        .init();

    let result = match cli.command {
        Commands::Init => run_init(&config, cli.json),
        Commands::Status => run_status(&config, cli.json),
        Commands::Config => run_config(&config, cli.json),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("ERROR: {}", e);
        exit(1);
    }
}
