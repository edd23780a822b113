//! Normalized schema model built from DDL.

/// YAML persistence of [`Tables`].
pub mod store;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::convention::TableConvention;
use crate::error::{Error, Result, SchemaError};
use crate::parser::table_builder::parse_table;
use crate::parser::type_inference::EntityType;

/// One table: plural name, columns and indexes in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Relation name without schema qualifier.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Indexes in declaration order; exactly one is the primary key.
    pub indexes: Vec<Index>,
    /// Derived from the table name by the convention resolver.
    pub is_read_only: bool,
}

/// One column with its inferred entity type and index back-references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Singular column name.
    pub name: String,
    /// Lower-case SQL type keyword, e.g. `bigint`.
    pub column_type: String,
    /// Abstract value type.
    pub entity_type: EntityType,
    /// First numeric type modifier, 0 when absent.
    pub size: u64,
    /// `AUTO_INCREMENT` was declared.
    pub is_auto_increment: bool,
    /// `UNSIGNED` was declared.
    pub is_unsigned: bool,
    /// `NOT NULL` was declared.
    pub is_not_null: bool,
    /// Literal default; `None` when absent or `NULL`.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Covered by the primary key.
    pub is_primary_key: bool,
    /// Names of the non-primary unique indexes covering this column.
    #[serde(default)]
    pub unique_index_keys: Vec<String>,
    /// Names of the non-unique indexes covering this column.
    #[serde(default)]
    pub index_keys: Vec<String>,
}

/// One index; column order defines lookup order and finder names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name (`PRIMARY` for the primary key).
    pub name: String,
    /// This is the primary key.
    pub is_primary_key: bool,
    /// Values are unique (always true for the primary key).
    pub is_unique: bool,
    /// Covered column names in key order.
    pub columns: Vec<String>,
}

impl Table {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The single primary-key index.
    pub fn primary_key(&self) -> Option<&Index> {
        self.indexes.iter().find(|i| i.is_primary_key)
    }

    /// The column covered by the primary key.
    pub fn primary_key_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    /// Access convention, resolved from the table name.
    pub fn convention(&self) -> TableConvention {
        TableConvention::resolve(&self.name)
    }

    /// True when a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Ordered collection of parsed tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tables {
    tables: Vec<Table>,
}

impl Tables {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table, rejecting duplicate names.
    pub fn push(&mut self, table: Table) -> std::result::Result<(), SchemaError> {
        if self.get(&table.name).is_some() {
            return Err(SchemaError::DuplicateTable { table: table.name });
        }
        self.tables.push(table);
        Ok(())
    }

    /// Look up a table by name.
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Tables in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Table> {
        self.tables.iter()
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no table was loaded.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Parse every `*.sql` file in `dir`, sorted by file name.
    ///
    /// Stops at the first file that fails, naming it in the error.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::io(dir, e))?.path();
            if path.extension().is_some_and(|e| e == "sql") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut tables = Self::new();
        for path in paths {
            let ddl = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            let table = parse_table(&ddl).map_err(|source| Error::Table {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(
                table = %table.name,
                columns = table.columns.len(),
                indexes = table.indexes.len(),
                "parsed {}",
                path.display()
            );
            tables.push(table).map_err(|source| Error::Table { path, source })?;
        }
        Ok(tables)
    }
}

impl FromIterator<Table> for Tables {
    fn from_iter<I: IntoIterator<Item = Table>>(iter: I) -> Self {
        Self {
            tables: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Tables {
    type Item = &'a Table;
    type IntoIter = std::slice::Iter<'a, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> Table {
        parse_table(&format!(
            "CREATE TABLE {name} (id BIGINT UNSIGNED NOT NULL, PRIMARY KEY (id));"
        ))
        .unwrap()
    }

    #[test]
    fn push_rejects_duplicate_names() {
        let mut tables = Tables::new();
        tables.push(table("items")).unwrap();
        let err = tables.push(table("items")).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateTable {
                table: "items".to_string()
            }
        );
        assert_eq!(tables.len(), 1);
    }

    #[test]
    fn primary_key_helpers() {
        let items = table("items");
        assert_eq!(items.primary_key().unwrap().name, "PRIMARY");
        assert_eq!(items.primary_key_column().unwrap().name, "id");
        assert!(items.has_column("id"));
        assert!(!items.has_column("name"));
    }
}
