#![allow(dead_code)]

use magrathea_core::{
    open_db_in_memory, Command, Entity, Migration, OpenOptions, Projection, Query, Scalar,
    SqliteRepository,
};
use rusqlite::{params, Connection, Row};
use std::fmt::{Display, Formatter};

pub const WIDGET_MIGRATIONS: &[Migration] = &[Migration::new(
    1,
    "CREATE TABLE widgets (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    );",
)];

pub fn widget_repo() -> SqliteRepository {
    let ctx = open_db_in_memory(&OpenOptions::with_migrations(WIDGET_MIGRATIONS)).unwrap();
    SqliteRepository::try_new_requiring(ctx, &["widgets"]).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    pub id: i64,
    pub name: String,
}

impl Entity for Widget {
    const TABLE: &'static str = "widgets";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetSummary {
    pub id: i64,
    pub name: String,
}

pub struct InsertWidget {
    pub id: i64,
    pub name: String,
}

impl InsertWidget {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

impl Command for InsertWidget {
    type Error = rusqlite::Error;

    fn execute(&self, conn: &Connection) -> Result<(), Self::Error> {
        conn.execute(
            "INSERT INTO widgets (id, name) VALUES (?1, ?2);",
            params![self.id, self.name],
        )?;
        Ok(())
    }
}

/// Domain error raised by `RenameWidget`; the facade must hand it back as is.
#[derive(Debug, PartialEq, Eq)]
pub enum WidgetError {
    NotFound(i64),
    Storage(String),
}

impl Display for WidgetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "widget not found: {id}"),
            Self::Storage(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for WidgetError {}

pub struct RenameWidget {
    pub id: i64,
    pub name: String,
}

impl Command for RenameWidget {
    type Error = WidgetError;

    fn execute(&self, conn: &Connection) -> Result<(), Self::Error> {
        let changed = conn
            .execute(
                "UPDATE widgets SET name = ?1 WHERE id = ?2;",
                params![self.name, self.id],
            )
            .map_err(|err| WidgetError::Storage(err.to_string()))?;
        if changed == 0 {
            return Err(WidgetError::NotFound(self.id));
        }
        Ok(())
    }
}

pub struct FindWidgetById(pub i64);

impl Scalar for FindWidgetById {
    type Output = Widget;
    type Error = rusqlite::Error;

    fn execute(&self, conn: &Connection) -> Result<Widget, Self::Error> {
        conn.query_row(
            "SELECT id, name FROM widgets WHERE id = ?1;",
            [self.0],
            |row| Widget::from_row(row),
        )
    }
}

pub struct CountWidgets;

impl Scalar for CountWidgets {
    type Output = i64;
    type Error = rusqlite::Error;

    fn execute(&self, conn: &Connection) -> Result<i64, Self::Error> {
        conn.query_row("SELECT COUNT(*) FROM widgets;", [], |row| row.get(0))
    }
}

pub struct AllWidgets;

impl Query for AllWidgets {
    type Item = Widget;
    type Error = rusqlite::Error;

    fn execute(&self, conn: &Connection) -> Result<Vec<Widget>, Self::Error> {
        let mut stmt = conn.prepare("SELECT id, name FROM widgets ORDER BY id ASC;")?;
        let rows = stmt.query_map([], |row| Widget::from_row(row))?;
        rows.collect()
    }
}

pub struct WidgetSummaries;

impl Projection for WidgetSummaries {
    type Selection = Widget;
    type Output = WidgetSummary;
    type Error = rusqlite::Error;

    fn execute(&self, conn: &Connection) -> Result<Vec<WidgetSummary>, Self::Error> {
        let widgets = AllWidgets.execute(conn)?;
        Ok(widgets
            .into_iter()
            .map(|widget| WidgetSummary {
                id: widget.id,
                name: widget.name,
            })
            .collect())
    }
}

/// Command that panics mid-dispatch while holding the context.
pub struct ExplodingCommand;

impl Command for ExplodingCommand {
    type Error = rusqlite::Error;

    fn execute(&self, _conn: &Connection) -> Result<(), Self::Error> {
        panic!("exploding command");
    }
}
