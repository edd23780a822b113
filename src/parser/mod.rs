/// Identifier and table-name normalization helpers (schema-qualified names, quoted identifiers).
pub mod names;
/// Thin wrapper around `sqlparser` for `CREATE TABLE` parsing.
pub mod sql_parser;
/// Conversion of a parsed `CREATE TABLE` into a [`Table`](crate::schema::Table).
pub mod table_builder;
/// Mapping from SQL column types to entity types.
pub mod type_inference;
