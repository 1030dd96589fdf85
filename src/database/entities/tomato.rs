//! Task timer tables

use crate::database::core::{
    ColumnType, Entity, EntityDescriptor, FieldDef, Record, CREATED_AT, UPDATED_AT,
};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomatoTask {
    pub name: String,
    pub note: String,
    pub done: bool,
}

impl Entity for TomatoTask {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        name: "TomatoTask",
        table: "tomato_tasks",
        fields: &[
            FieldDef::id(),
            CREATED_AT,
            UPDATED_AT,
            FieldDef::new("name", ColumnType::Text).not_null(),
            FieldDef::new("note", ColumnType::Text),
            FieldDef::new("done", ColumnType::Boolean).not_null().default("0"),
        ],
    };
}

impl Record for TomatoTask {
    const COLUMNS: &'static [&'static str] = &["name", "note", "done"];

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![&self.name as &dyn ToSql, &self.note, &self.done]
    }
}

/// One timed work session against a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomatoPlan {
    pub task_id: i64,
    pub duration_mins: i64,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl Entity for TomatoPlan {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        name: "TomatoPlan",
        table: "tomato_plans",
        fields: &[
            FieldDef::id(),
            CREATED_AT,
            UPDATED_AT,
            FieldDef::new("task_id", ColumnType::Custom("INTEGER REFERENCES tomato_tasks(id)")),
            FieldDef::new("duration_mins", ColumnType::Integer)
                .not_null()
                .default("25"),
            FieldDef::new("started_at", ColumnType::Timestamp),
            FieldDef::new("finished_at", ColumnType::Timestamp),
        ],
    };
}

impl Record for TomatoPlan {
    const COLUMNS: &'static [&'static str] =
        &["task_id", "duration_mins", "started_at", "finished_at"];

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.task_id as &dyn ToSql,
            &self.duration_mins,
            &self.started_at,
            &self.finished_at,
        ]
    }
}
