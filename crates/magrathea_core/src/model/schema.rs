//! Schema catalog entity.
//!
//! # Responsibility
//! - Map rows of `sqlite_master` for introspection queries.

use crate::operation::Entity;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// One table, index, view or trigger known to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaObject {
    /// Serialized as `type` to match the catalog column.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    /// Table the object belongs to; equals `name` for tables.
    pub table_name: String,
    /// Creation statement. `None` for automatic indexes.
    pub sql: Option<String>,
}

impl SchemaObject {
    pub fn into_name(self) -> String {
        self.name
    }

    pub fn is_table(&self) -> bool {
        self.kind == "table"
    }
}

impl Entity for SchemaObject {
    const TABLE: &'static str = "sqlite_master";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            kind: row.get("type")?,
            name: row.get("name")?,
            table_name: row.get("tbl_name")?,
            sql: row.get("sql")?,
        })
    }
}
