//! Uploaded file index

use crate::database::core::{
    ColumnType, Entity, EntityDescriptor, FieldDef, Record, CREATED_AT, UPDATED_AT,
};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// A file stored in the upload directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the upload directory
    pub path: String,
    /// Bytes; sizes beyond `i64::MAX` fail at insert
    pub size: u64,
    /// RFC 3339 modification time, if the filesystem reports one
    pub modified_at: Option<String>,
}

impl Entity for FileEntry {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        name: "File",
        table: "files",
        fields: &[
            FieldDef::id(),
            CREATED_AT,
            UPDATED_AT,
            FieldDef::new("name", ColumnType::Text).not_null(),
            FieldDef::new("path", ColumnType::Text).not_null().unique(),
            FieldDef::new("size", ColumnType::Integer).not_null().default("0"),
            FieldDef::new("modified_at", ColumnType::Timestamp),
        ],
    };
}

impl Record for FileEntry {
    const COLUMNS: &'static [&'static str] = &["name", "path", "size", "modified_at"];

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.name as &dyn ToSql,
            &self.path,
            &self.size,
            &self.modified_at,
        ]
    }
}
