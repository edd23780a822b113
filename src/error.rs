use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used by the loading and output layers.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal problems found while turning one `CREATE TABLE` statement into a
/// [`Table`](crate::schema::Table).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The SQL parser rejected the text.
    #[error("SQL syntax error: {message}")]
    Syntax {
        /// Parser diagnostic.
        message: String,
    },

    /// The text held zero or several statements.
    #[error("expected exactly one statement, found {count}")]
    NotSingleStatement {
        /// Number of statements found.
        count: usize,
    },

    /// The statement parsed but is not a `CREATE TABLE`.
    #[error("not a CREATE TABLE statement")]
    NotCreateTable,

    /// No `PRIMARY KEY` was declared.
    #[error("table '{table}' needs a primary key")]
    MissingPrimaryKey {
        /// Table name.
        table: String,
    },

    /// The primary key spans more than one column.
    #[error("table '{table}' has a composite primary key ({columns})")]
    CompositePrimaryKey {
        /// Table name.
        table: String,
        /// Comma-separated key columns.
        columns: String,
    },

    /// `PRIMARY KEY` was declared more than once.
    #[error("table '{table}' declares more than one primary key")]
    MultiplePrimaryKeys {
        /// Table name.
        table: String,
    },

    /// Table names must be plural nouns.
    #[error("table name '{table}' is not plural")]
    SingularTableName {
        /// Table name.
        table: String,
    },

    /// Index-covered column names must be singular nouns.
    #[error("column '{column}' of table '{table}' is not singular")]
    PluralColumnName {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A type modifier such as `VARCHAR(4x)` is not a number.
    #[error("column '{column}' has a malformed type modifier '{modifier}'")]
    InvalidTypeModifier {
        /// Column name.
        column: String,
        /// Offending modifier text.
        modifier: String,
    },

    /// Two columns share a name.
    #[error("column '{column}' of table '{table}' is declared twice")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// An index refers to a column that is not declared.
    #[error("index '{index}' of table '{table}' refers to unknown column '{column}'")]
    UnknownIndexColumn {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
        /// Column name.
        column: String,
    },

    /// A stored schema carries a read-only flag its table name contradicts.
    #[error("table '{table}' is stored with is_read_only: {stored}, but its name implies {expected}")]
    StaleReadOnlyFlag {
        /// Table name.
        table: String,
        /// Flag found in the stored schema.
        stored: bool,
        /// Flag implied by the table name.
        expected: bool,
    },

    /// Two DDL files declare the same table.
    #[error("table '{table}' is declared twice")]
    DuplicateTable {
        /// Table name.
        table: String,
    },
}

/// Crate-level error: schema problems plus the I/O around them.
#[derive(Debug, Error)]
pub enum Error {
    /// A schema error without file context.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A schema error raised while parsing a specific DDL file.
    #[error("{}: {source}", path.display())]
    Table {
        /// The offending DDL file.
        path: PathBuf,
        /// What went wrong.
        source: SchemaError,
    },

    /// Filesystem failure, with the path involved.
    #[error("{}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The schema store could not be encoded or decoded.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A description dump could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An output file name would escape the output directory.
    #[error("invalid output name '{name}': {reason}")]
    InvalidOutputName {
        /// Rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
