//! End-to-end startup behaviour against a database file on disk

use beyond::database::entities::{self, Area, BillLedger, BillType, FileEntry};
use beyond::database::{
    BeyondDatabase, ColumnType, DatabaseConfig, Entity, EntityDescriptor, FieldDef, Filter,
    SchemaRegistry, SchemaStatus, SeedOutcome, SeedPipeline, SeedStage,
};
use beyond::{DbError, QueryError, RunMode};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn db_config(dir: &TempDir, mode: RunMode) -> DatabaseConfig {
    DatabaseConfig::new(dir.path().join("beyond.db"), mode)
}

fn table_exists(path: &Path, table: &str) -> bool {
    let conn = Connection::open(path).unwrap();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )
        .unwrap();
    count > 0
}

fn default_ledgers(db: &BeyondDatabase) -> u64 {
    db.count::<BillLedger>(&Filter::expr("is_default = ?").bind(true))
        .unwrap()
}

#[test]
fn empty_database_in_debug_mode_is_seeded() {
    let dir = TempDir::new().unwrap();
    let db = BeyondDatabase::connect(&db_config(&dir, RunMode::Debug)).unwrap();

    assert_eq!(db.count::<BillType>(&Filter::all()).unwrap(), 6);
    assert_eq!(db.count::<BillLedger>(&Filter::all()).unwrap(), 1);
    assert_eq!(default_ledgers(&db), 1);
    assert_eq!(db.count::<Area>(&Filter::all()).unwrap(), 34);
}

#[test]
fn second_connect_leaves_counts_unchanged() {
    let dir = TempDir::new().unwrap();
    let config = db_config(&dir, RunMode::Release);

    drop(BeyondDatabase::connect(&config).unwrap());
    let db = BeyondDatabase::connect(&config).unwrap();

    assert_eq!(db.count::<BillType>(&Filter::all()).unwrap(), 6);
    assert_eq!(db.count::<BillLedger>(&Filter::all()).unwrap(), 1);
    assert!(db
        .seed_reports()
        .iter()
        .all(|r| matches!(r.outcome, SeedOutcome::Skipped { .. })));
}

#[test]
fn repeated_startups_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let config = db_config(&dir, RunMode::Release);

    for _ in 0..5 {
        let db = BeyondDatabase::connect(&config).unwrap();
        assert_eq!(db.count::<BillType>(&Filter::all()).unwrap(), 6);
        assert_eq!(db.count::<BillLedger>(&Filter::all()).unwrap(), 1);
        assert_eq!(db.count::<Area>(&Filter::all()).unwrap(), 34);
    }
}

#[test]
fn deleted_default_ledger_is_reseeded() {
    let dir = TempDir::new().unwrap();
    let config = db_config(&dir, RunMode::Release);

    {
        let db = BeyondDatabase::connect(&config).unwrap();
        db.client()
            .with_conn(|conn| {
                conn.execute("DELETE FROM bill_ledgers", [])
                    .map_err(QueryError::from)
            })
            .unwrap();
        assert_eq!(db.count::<BillLedger>(&Filter::all()).unwrap(), 0);
    }

    let db = BeyondDatabase::connect(&config).unwrap();
    assert_eq!(db.count::<BillLedger>(&Filter::all()).unwrap(), 1);
    assert_eq!(default_ledgers(&db), 1);
    // untouched stage keeps its rows
    assert_eq!(db.count::<BillType>(&Filter::all()).unwrap(), 6);
}

#[test]
fn operator_edits_survive_restart() {
    let dir = TempDir::new().unwrap();
    let config = db_config(&dir, RunMode::Release);

    {
        let db = BeyondDatabase::connect(&config).unwrap();
        db.client()
            .with_conn(|conn| {
                conn.execute_batch(
                    "DELETE FROM bill_types WHERE name <> '🍖餐饮';
                     UPDATE bill_types SET note = 'edited';",
                )
                .map_err(QueryError::from)
            })
            .unwrap();
    }

    let db = BeyondDatabase::connect(&config).unwrap();
    assert_eq!(db.count::<BillType>(&Filter::all()).unwrap(), 1);
    assert_eq!(
        db.count::<BillType>(&Filter::expr("note = ?").bind("edited".to_string()))
            .unwrap(),
        1
    );
}

#[test]
fn schema_sync_stops_at_first_bad_descriptor() {
    const BROKEN: EntityDescriptor = EntityDescriptor {
        name: "Broken",
        table: "broken",
        fields: &[FieldDef::new("value", ColumnType::Custom("NOT A; TYPE"))],
    };

    let dir = TempDir::new().unwrap();
    let config = db_config(&dir, RunMode::Release);
    let registry = SchemaRegistry::new()
        .with(BillType::DESCRIPTOR)
        .with(BROKEN)
        .with(BillLedger::DESCRIPTOR);

    let err = BeyondDatabase::connect_with(&config, &registry, &SeedPipeline::new()).unwrap_err();
    match &err {
        DbError::SchemaSync { descriptor, .. } => assert_eq!(descriptor, "Broken"),
        other => panic!("unexpected error: {}", other),
    }

    assert!(table_exists(&config.path, "bill_types"));
    assert!(!table_exists(&config.path, "broken"));
    assert!(!table_exists(&config.path, "bill_ledgers"));
}

#[test]
fn failed_seeding_returns_no_handle() {
    let dir = TempDir::new().unwrap();
    let config = db_config(&dir, RunMode::Release);

    let pipeline = SeedPipeline::new()
        .stage(SeedStage::canonical("bill type", || {
            Ok(vec![BillType::new("only", "")])
        }))
        .stage(SeedStage::canonical("file", || {
            Err::<Vec<FileEntry>, _>(DbError::Io {
                path: "/uploads".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }))
        .stage(SeedStage::canonical("bill ledger", || {
            Ok(vec![BillLedger {
                name: "never".to_string(),
                note: String::new(),
                is_default: true,
            }])
        }));

    let result = BeyondDatabase::connect_with(&config, &entities::registry(), &pipeline);
    let err = result.unwrap_err();
    assert_eq!(err.context(), Some("file"));

    // a fresh startup runs the standard pipeline; the stage that committed
    // before the failure is kept, the rest are seeded now
    let db = BeyondDatabase::connect(&config).unwrap();
    assert_eq!(db.count::<BillType>(&Filter::all()).unwrap(), 1);
    assert_eq!(db.count::<BillLedger>(&Filter::all()).unwrap(), 1);
    assert_eq!(default_ledgers(&db), 1);
}

#[test]
fn upload_directory_is_indexed_once() {
    let dir = TempDir::new().unwrap();
    let uploads = dir.path().join("files");
    std::fs::create_dir_all(uploads.join("2024")).unwrap();
    std::fs::write(uploads.join("a.txt"), b"a").unwrap();
    std::fs::write(uploads.join("2024").join("b.txt"), b"bb").unwrap();

    let config = db_config(&dir, RunMode::Release).with_file_dir(&uploads);
    let db = BeyondDatabase::connect(&config).unwrap();
    assert_eq!(db.count::<FileEntry>(&Filter::all()).unwrap(), 2);
    drop(db);

    std::fs::write(uploads.join("c.txt"), b"c").unwrap();
    let db = BeyondDatabase::connect(&config).unwrap();
    assert_eq!(db.count::<FileEntry>(&Filter::all()).unwrap(), 2);
}

#[test]
fn unopenable_path_is_connection_error() {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig::new(
        dir.path().join("missing").join("beyond.db"),
        RunMode::Release,
    );

    let err = BeyondDatabase::connect(&config).unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLog {
    type Writer = CapturedLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn connect_logged(config: &DatabaseConfig) -> String {
    let log = CapturedLog::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(log.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        BeyondDatabase::connect(config).unwrap();
    });
    let bytes = log.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).to_string()
}

#[test]
fn debug_mode_logs_seed_statements() {
    let dir = TempDir::new().unwrap();
    let output = connect_logged(&db_config(&dir, RunMode::Debug));

    assert!(output.contains("beyond::sql"));
    assert!(output.contains("INSERT INTO \"bill_types\""));
}

#[test]
fn release_mode_does_not_log_statements() {
    let dir = TempDir::new().unwrap();
    let output = connect_logged(&db_config(&dir, RunMode::Release));

    assert!(!output.contains("beyond::sql"));
}

#[test]
fn legacy_table_with_rows_gains_new_columns() {
    let dir = TempDir::new().unwrap();
    let config = db_config(&dir, RunMode::Release);
    {
        let conn = Connection::open(&config.path).unwrap();
        conn.execute_batch(
            "CREATE TABLE bill_types (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL,
                 note TEXT
             );
             INSERT INTO bill_types (name, note) VALUES ('🍖餐饮', 'legacy');",
        )
        .unwrap();
    }

    let db = BeyondDatabase::connect(&config).unwrap();
    assert_eq!(db.count::<BillType>(&Filter::all()).unwrap(), 1);
    assert_eq!(
        db.count::<BillType>(&Filter::expr("created_at NOT NULL AND updated_at NOT NULL"))
            .unwrap(),
        1
    );

    let status = db.status(&SchemaRegistry::new().with(BillType::DESCRIPTOR)).unwrap();
    assert_eq!(status[0].schema, SchemaStatus::Current);
    assert_eq!(db.count::<BillLedger>(&Filter::all()).unwrap(), 1);
}
