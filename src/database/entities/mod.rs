//! Entity tables of the application
//!
//! Each entity pairs a row type with its static [`EntityDescriptor`]. The
//! [`registry`] lists them in the order the schema is synchronized.

mod bill;
mod file;
mod habit;
mod tomato;
mod travel;

pub use bill::{BillDetails, BillLedger, BillType};
pub use file::FileEntry;
pub use habit::Habit;
pub use tomato::{TomatoPlan, TomatoTask};
pub use travel::{Area, Travel};

use crate::database::core::{Entity, SchemaRegistry};

/// Schema registry of every table the application persists
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with(BillDetails::DESCRIPTOR)
        .with(BillType::DESCRIPTOR)
        .with(BillLedger::DESCRIPTOR)
        .with(Area::DESCRIPTOR)
        .with(Travel::DESCRIPTOR)
        .with(FileEntry::DESCRIPTOR)
        .with(TomatoTask::DESCRIPTOR)
        .with(TomatoPlan::DESCRIPTOR)
        .with(Habit::DESCRIPTOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::{DbClient, FieldDef, Filter, SchemaManager, SchemaStatus};

    #[test]
    fn test_registry_order() {
        let names: Vec<&str> = registry().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "BillDetails",
                "BillType",
                "BillLedger",
                "Area",
                "Travel",
                "File",
                "TomatoTask",
                "TomatoPlan",
                "Habit"
            ]
        );
    }

    #[test]
    fn test_descriptors_are_valid() {
        for descriptor in registry().iter() {
            assert!(
                descriptor.create_table_sql().is_ok(),
                "{} should produce valid DDL",
                descriptor.name
            );
            assert_eq!(descriptor.fields.first(), Some(&FieldDef::id()));
        }
    }

    #[test]
    fn test_registry_syncs() {
        let client = DbClient::open_in_memory().unwrap();
        let registry = registry();
        client
            .with_conn(|conn| SchemaManager::new(conn).sync(&registry))
            .unwrap();

        client
            .with_conn(|conn| {
                let manager = SchemaManager::new(conn);
                for descriptor in registry.iter() {
                    assert_eq!(manager.status(descriptor)?, SchemaStatus::Current);
                }
                Ok::<_, crate::error::QueryError>(())
            })
            .unwrap();
    }

    #[test]
    fn test_insert_and_count_entities() {
        let client = DbClient::open_in_memory().unwrap();
        client
            .with_conn(|conn| SchemaManager::new(conn).sync(&registry()))
            .unwrap();

        let task = TomatoTask {
            name: "write report".to_string(),
            note: String::new(),
            done: false,
        };
        client.insert_batch(&[task]).unwrap();
        client
            .insert_batch(&[TomatoPlan {
                task_id: 1,
                duration_mins: 25,
                started_at: Some("2024-01-01 09:00:00".to_string()),
                finished_at: None,
            }])
            .unwrap();
        client
            .insert_batch(&[
                BillDetails {
                    kind: "pay".to_string(),
                    money: 12.5,
                    name: "lunch".to_string(),
                    bill_type: "🍖餐饮".to_string(),
                    ledger: "📚默认".to_string(),
                    note: String::new(),
                },
                BillDetails {
                    kind: "income".to_string(),
                    money: 1000.0,
                    name: "salary".to_string(),
                    bill_type: String::new(),
                    ledger: "📚默认".to_string(),
                    note: String::new(),
                },
            ])
            .unwrap();

        assert_eq!(client.count::<TomatoTask>(&Filter::all()).unwrap(), 1);
        assert_eq!(client.count::<TomatoPlan>(&Filter::all()).unwrap(), 1);
        assert_eq!(
            client
                .count::<BillDetails>(&Filter::expr("kind = ?").bind("pay".to_string()))
                .unwrap(),
            1
        );
        assert_eq!(client.count::<Habit>(&Filter::all()).unwrap(), 0);
        assert_eq!(client.count::<Travel>(&Filter::all()).unwrap(), 0);
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let client = DbClient::open_in_memory().unwrap();
        client
            .with_conn(|conn| SchemaManager::new(conn).sync(&registry()))
            .unwrap();

        let huge = FileEntry {
            name: "huge.bin".to_string(),
            path: "huge.bin".to_string(),
            size: u64::MAX,
            modified_at: None,
        };
        assert!(client.insert_batch(&[huge]).is_err());
        assert_eq!(client.count::<FileEntry>(&Filter::all()).unwrap(), 0);
    }
}
