//! Operation capability contracts consumed by repository facades.
//!
//! # Responsibility
//! - Define the closed set of prebuilt operation shapes: command, scalar
//!   query, collection query and projection query.
//! - Let each operation pick its own error type.
//!
//! # Invariants
//! - Every shape exposes exactly one `execute` entry point taking the raw
//!   connection.
//! - Facades call `execute` once per dispatch and never look inside.

use rusqlite::{Connection, Row};

pub mod sql;

pub use sql::{
    schema_catalog, schema_names, schema_version, EntityQuery, ProjectedQuery, SqlCommand,
    SqlScalar,
};

/// Row-mapped record type that can be selected from a table.
///
/// Projection queries may only select from entity types.
pub trait Entity: Sized {
    /// Table (or view) the entity is stored in.
    const TABLE: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Operation that mutates persisted state and returns nothing.
pub trait Command {
    type Error;

    fn execute(&self, conn: &Connection) -> Result<(), Self::Error>;
}

/// Operation that returns exactly one value.
pub trait Scalar {
    type Output;
    type Error;

    fn execute(&self, conn: &Connection) -> Result<Self::Output, Self::Error>;
}

/// Operation that returns zero or more values.
///
/// Ordering and uniqueness are whatever the query itself establishes.
pub trait Query {
    type Item;
    type Error;

    fn execute(&self, conn: &Connection) -> Result<Vec<Self::Item>, Self::Error>;
}

/// Collection query that selects `Selection` entities and returns them
/// reshaped as `Output`.
pub trait Projection {
    type Selection: Entity;
    type Output;
    type Error;

    fn execute(&self, conn: &Connection) -> Result<Vec<Self::Output>, Self::Error>;
}
