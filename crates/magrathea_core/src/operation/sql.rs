//! Reusable SQL-backed operation objects.
//!
//! These cover the common single-statement cases so callers only write
//! bespoke operation types for multi-step logic.

use super::{Command, Entity, Projection, Query, Scalar};
use crate::model::schema::SchemaObject;
use rusqlite::types::{FromSql, Value};
use rusqlite::{params_from_iter, Connection};
use std::marker::PhantomData;

/// Single statement executed with positional parameters.
#[derive(Debug, Clone)]
pub struct SqlCommand {
    sql: String,
    params: Vec<Value>,
}

impl SqlCommand {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Appends the next positional parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

impl Command for SqlCommand {
    type Error = rusqlite::Error;

    fn execute(&self, conn: &Connection) -> Result<(), Self::Error> {
        conn.execute(&self.sql, params_from_iter(self.params.iter()))?;
        Ok(())
    }
}

/// Reads column 0 of the first row returned by `sql`.
///
/// An empty result is reported as `QueryReturnedNoRows`.
#[derive(Debug, Clone)]
pub struct SqlScalar<T> {
    sql: String,
    params: Vec<Value>,
    _output: PhantomData<fn() -> T>,
}

impl<T> SqlScalar<T> {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            _output: PhantomData,
        }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

impl<T: FromSql> Scalar for SqlScalar<T> {
    type Output = T;
    type Error = rusqlite::Error;

    fn execute(&self, conn: &Connection) -> Result<T, Self::Error> {
        conn.query_row(&self.sql, params_from_iter(self.params.iter()), |row| {
            row.get::<_, T>(0)
        })
    }
}

/// Selects rows of `E::TABLE`, optionally filtered and ordered.
///
/// Filter and order fragments are `'static` so they come from code, never
/// from user input; values go through `bind`.
#[derive(Debug, Clone)]
pub struct EntityQuery<E> {
    filter: Option<&'static str>,
    order_by: Option<&'static str>,
    params: Vec<Value>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityQuery<E> {
    /// Every row, in storage order.
    pub fn all() -> Self {
        Self {
            filter: None,
            order_by: None,
            params: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Restricts rows with a `WHERE` fragment such as `"id = ?1"`.
    pub fn filter(mut self, predicate: &'static str) -> Self {
        self.filter = Some(predicate);
        self
    }

    pub fn order_by(mut self, columns: &'static str) -> Self {
        self.order_by = Some(columns);
        self
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Reshapes the selected rows with `map`.
    pub fn project<P, F>(self, map: F) -> ProjectedQuery<E, P, F>
    where
        F: Fn(E) -> P,
    {
        ProjectedQuery::new(self, map)
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", E::TABLE);
        if let Some(predicate) = self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        if let Some(columns) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(columns);
        }
        sql
    }
}

impl<E: Entity> Query for EntityQuery<E> {
    type Item = E;
    type Error = rusqlite::Error;

    fn execute(&self, conn: &Connection) -> Result<Vec<E>, Self::Error> {
        let mut stmt = conn.prepare(&self.to_sql())?;
        let rows = stmt.query_map(params_from_iter(self.params.iter()), |row| E::from_row(row))?;
        rows.collect()
    }
}

/// Entity selection followed by a per-row mapping.
pub struct ProjectedQuery<E, P, F> {
    selection: EntityQuery<E>,
    map: F,
    _output: PhantomData<fn() -> P>,
}

impl<E, P, F> ProjectedQuery<E, P, F>
where
    E: Entity,
    F: Fn(E) -> P,
{
    pub fn new(selection: EntityQuery<E>, map: F) -> Self {
        Self {
            selection,
            map,
            _output: PhantomData,
        }
    }
}

impl<E, P, F> Projection for ProjectedQuery<E, P, F>
where
    E: Entity,
    F: Fn(E) -> P,
{
    type Selection = E;
    type Output = P;
    type Error = rusqlite::Error;

    fn execute(&self, conn: &Connection) -> Result<Vec<P>, Self::Error> {
        let selected = Query::execute(&self.selection, conn)?;
        Ok(selected.into_iter().map(&self.map).collect())
    }
}

/// Every schema object, ordered by name.
pub fn schema_catalog() -> EntityQuery<SchemaObject> {
    EntityQuery::all().order_by("name")
}

/// Names of user tables, ordered by name.
pub fn schema_names() -> ProjectedQuery<SchemaObject, String, fn(SchemaObject) -> String> {
    EntityQuery::all()
        .filter("type = 'table' AND name NOT LIKE 'sqlite_%'")
        .order_by("name")
        .project(SchemaObject::into_name as fn(SchemaObject) -> String)
}

/// Current `PRAGMA user_version`.
pub fn schema_version() -> SqlScalar<u32> {
    SqlScalar::new("PRAGMA user_version;")
}
