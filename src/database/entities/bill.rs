//! Finance ledger tables

use crate::database::core::{
    ColumnType, Entity, EntityDescriptor, FieldDef, Record, CREATED_AT, UPDATED_AT,
};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// A single income or expense entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillDetails {
    /// `pay` or `income`
    pub kind: String,
    pub money: f64,
    pub name: String,
    /// Name of the bill category
    #[serde(rename = "type")]
    pub bill_type: String,
    /// Name of the ledger the entry is booked on
    pub ledger: String,
    pub note: String,
}

impl Entity for BillDetails {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        name: "BillDetails",
        table: "bill_details",
        fields: &[
            FieldDef::id(),
            CREATED_AT,
            UPDATED_AT,
            FieldDef::new("kind", ColumnType::Text).not_null().default("'pay'"),
            FieldDef::new("money", ColumnType::Real).not_null().default("0"),
            FieldDef::new("name", ColumnType::Text),
            FieldDef::new("type", ColumnType::Text),
            FieldDef::new("ledger", ColumnType::Text),
            FieldDef::new("note", ColumnType::Text),
        ],
    };
}

impl Record for BillDetails {
    const COLUMNS: &'static [&'static str] = &["kind", "money", "name", "type", "ledger", "note"];

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.kind as &dyn ToSql,
            &self.money,
            &self.name,
            &self.bill_type,
            &self.ledger,
            &self.note,
        ]
    }
}

/// Bill category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillType {
    pub name: String,
    pub note: String,
}

impl BillType {
    pub fn new(name: &str, note: &str) -> Self {
        BillType {
            name: name.to_string(),
            note: note.to_string(),
        }
    }
}

impl Entity for BillType {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        name: "BillType",
        table: "bill_types",
        fields: &[
            FieldDef::id(),
            CREATED_AT,
            UPDATED_AT,
            FieldDef::new("name", ColumnType::Text).not_null().unique(),
            FieldDef::new("note", ColumnType::Text),
        ],
    };
}

impl Record for BillType {
    const COLUMNS: &'static [&'static str] = &["name", "note"];

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![&self.name as &dyn ToSql, &self.note]
    }
}

/// Account book grouping bill entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLedger {
    pub name: String,
    pub note: String,
    pub is_default: bool,
}

impl Entity for BillLedger {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        name: "BillLedger",
        table: "bill_ledgers",
        fields: &[
            FieldDef::id(),
            CREATED_AT,
            UPDATED_AT,
            FieldDef::new("name", ColumnType::Text).not_null().unique(),
            FieldDef::new("note", ColumnType::Text),
            FieldDef::new("is_default", ColumnType::Boolean)
                .not_null()
                .default("0"),
        ],
    };
}

impl Record for BillLedger {
    const COLUMNS: &'static [&'static str] = &["name", "note", "is_default"];

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![&self.name as &dyn ToSql, &self.note, &self.is_default]
    }
}
