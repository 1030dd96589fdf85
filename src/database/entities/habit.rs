//! Habit tracker table

use crate::database::core::{
    ColumnType, Entity, EntityDescriptor, FieldDef, Record, CREATED_AT, UPDATED_AT,
};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub name: String,
    /// e.g. `daily`, `weekly`
    pub frequency: String,
    pub note: String,
    pub archived: bool,
}

impl Entity for Habit {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        name: "Habit",
        table: "habits",
        fields: &[
            FieldDef::id(),
            CREATED_AT,
            UPDATED_AT,
            FieldDef::new("name", ColumnType::Text).not_null(),
            FieldDef::new("frequency", ColumnType::Text)
                .not_null()
                .default("'daily'"),
            FieldDef::new("note", ColumnType::Text),
            FieldDef::new("archived", ColumnType::Boolean)
                .not_null()
                .default("0"),
        ],
    };
}

impl Record for Habit {
    const COLUMNS: &'static [&'static str] = &["name", "frequency", "note", "archived"];

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.name as &dyn ToSql,
            &self.frequency,
            &self.note,
            &self.archived,
        ]
    }
}
