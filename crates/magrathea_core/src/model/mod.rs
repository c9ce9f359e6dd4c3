//! Entity types shipped with the core crate.
//!
//! # Responsibility
//! - Provide row-mapped entities for built-in introspection queries.
//!
//! # Invariants
//! - Every entity maps one row of its table without extra queries.

pub mod schema;
