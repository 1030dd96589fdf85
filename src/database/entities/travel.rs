//! Travel log tables

use crate::database::core::{
    ColumnType, Entity, EntityDescriptor, FieldDef, Record, CREATED_AT, UPDATED_AT,
};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// Administrative area a trip can be attributed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Six-digit administrative division code
    pub code: String,
    pub name: String,
}

impl Area {
    pub fn new(code: &str, name: &str) -> Self {
        Area {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

impl Entity for Area {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        name: "Area",
        table: "areas",
        fields: &[
            FieldDef::id(),
            CREATED_AT,
            UPDATED_AT,
            FieldDef::new("code", ColumnType::Text).not_null().unique(),
            FieldDef::new("name", ColumnType::Text).not_null(),
        ],
    };
}

impl Record for Area {
    const COLUMNS: &'static [&'static str] = &["code", "name"];

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![&self.code as &dyn ToSql, &self.name]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Travel {
    pub area_code: String,
    pub title: String,
    pub note: String,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
}

impl Entity for Travel {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        name: "Travel",
        table: "travels",
        fields: &[
            FieldDef::id(),
            CREATED_AT,
            UPDATED_AT,
            FieldDef::new("area_code", ColumnType::Text).not_null(),
            FieldDef::new("title", ColumnType::Text),
            FieldDef::new("note", ColumnType::Text),
            FieldDef::new("start_at", ColumnType::Timestamp),
            FieldDef::new("end_at", ColumnType::Timestamp),
        ],
    };
}

impl Record for Travel {
    const COLUMNS: &'static [&'static str] = &["area_code", "title", "note", "start_at", "end_at"];

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.area_code as &dyn ToSql,
            &self.title,
            &self.note,
            &self.start_at,
            &self.end_at,
        ]
    }
}
