//! Turn MySQL `CREATE TABLE` statements into a typed schema model and synthesize data-access code from it.
#![warn(missing_docs)]

/// Table-naming conventions: read-only, mutable and user-scoped tables.
pub mod convention;
/// Schema and I/O error types.
pub mod error;
/// Entity, data-access and model synthesis, lowered to a typed code IR.
pub mod generator;
/// Pluralization and identifier casing rules.
pub mod naming;
/// Rendering, file output and markdown report generation.
pub mod output;
/// DDL parsing and type inference.
pub mod parser;
/// Normalized schema model and its YAML store.
pub mod schema;
