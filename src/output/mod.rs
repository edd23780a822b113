/// Writes generated sources, the serialized schema and the report to disk.
pub mod formatter;
/// Go rendering of the code IR.
pub mod go;
/// Builds a Markdown summary of tables, conventions and finders.
pub mod report;
