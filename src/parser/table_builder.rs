//! Builds a validated [`Table`] from a `CREATE TABLE` statement.

use std::collections::{HashMap, HashSet};

use sqlparser::ast::{ColumnOptionDef, Expr, Value};

use crate::convention::is_read_only_table;
use crate::error::SchemaError;
use crate::naming;
use crate::parser::names::{index_column_name, relation_name};
use crate::parser::sql_parser::{
    parse_create_table, ColumnDef, ColumnOption, CreateTable, TableConstraint,
};
use crate::parser::type_inference::{infer_entity_type, RawColumnType};
use crate::schema::{Column, Index, Table};

const PRIMARY_INDEX_NAME: &str = "PRIMARY";

/// Parse one `CREATE TABLE` statement into a validated [`Table`].
pub fn parse_table(ddl: &str) -> Result<Table, SchemaError> {
    let create = parse_create_table(ddl)?;
    build_table(&create)
}

/// Build a [`Table`] from an already parsed `CREATE TABLE`.
///
/// Indexes are resolved before columns: column classification reads the
/// column → index side-table built from them.
pub fn build_table(create: &CreateTable) -> Result<Table, SchemaError> {
    let name = relation_name(&create.name.to_string());
    if naming::is_singular(&name) {
        return Err(SchemaError::SingularTableName { table: name });
    }

    let declared: HashSet<String> = create
        .columns
        .iter()
        .map(|c| c.name.value.clone())
        .collect();
    let indexes = collect_indexes(&name, create, &declared)?;
    check_primary_key(&name, &indexes)?;

    let mut owners: HashMap<&str, Vec<&Index>> = HashMap::new();
    for index in &indexes {
        for column in &index.columns {
            owners.entry(column.as_str()).or_default().push(index);
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(create.columns.len());
    for def in &create.columns {
        if columns.iter().any(|c| c.name == def.name.value) {
            return Err(SchemaError::DuplicateColumn {
                table: name,
                column: def.name.value.clone(),
            });
        }
        let owning = owners.get(def.name.value.as_str()).map_or(&[][..], Vec::as_slice);
        columns.push(build_column(def, owning)?);
    }

    Ok(Table {
        is_read_only: is_read_only_table(&name),
        name,
        columns,
        indexes,
    })
}

fn collect_indexes(
    table: &str,
    create: &CreateTable,
    declared: &HashSet<String>,
) -> Result<Vec<Index>, SchemaError> {
    let mut indexes = Vec::new();

    // Inline `PRIMARY KEY` / `UNIQUE` column options come first: they precede
    // the table constraints in the statement text.
    for def in &create.columns {
        for option in &def.options {
            if let ColumnOption::Unique { is_primary, .. } = &option.option {
                let is_primary = *is_primary;
                let column = def.name.value.clone();
                indexes.push(Index {
                    name: if is_primary {
                        PRIMARY_INDEX_NAME.to_string()
                    } else {
                        column.clone()
                    },
                    is_primary_key: is_primary,
                    is_unique: true,
                    columns: vec![column],
                });
            }
        }
    }

    for constraint in &create.constraints {
        let index = match constraint {
            TableConstraint::PrimaryKey { columns, .. } => Index {
                name: PRIMARY_INDEX_NAME.to_string(),
                is_primary_key: true,
                is_unique: true,
                columns: index_columns(columns),
            },
            TableConstraint::Unique {
                name,
                index_name,
                columns,
                ..
            } => {
                let columns = index_columns(columns);
                Index {
                    name: index_name
                        .as_ref()
                        .or(name.as_ref())
                        .map(|ident| ident.value.clone())
                        .unwrap_or_else(|| columns.first().cloned().unwrap_or_default()),
                    is_primary_key: false,
                    is_unique: true,
                    columns,
                }
            }
            TableConstraint::Index { name, columns, .. } => {
                let columns = index_columns(columns);
                Index {
                    name: name
                        .as_ref()
                        .map(|ident| ident.value.clone())
                        .unwrap_or_else(|| columns.first().cloned().unwrap_or_default()),
                    is_primary_key: false,
                    is_unique: false,
                    columns,
                }
            }
            // Foreign keys, checks and full-text indexes do not drive lookups.
            _ => continue,
        };
        indexes.push(index);
    }

    for index in &indexes {
        for column in &index.columns {
            if naming::is_plural(column) {
                return Err(SchemaError::PluralColumnName {
                    table: table.to_string(),
                    column: column.clone(),
                });
            }
            if !declared.contains(column) {
                return Err(SchemaError::UnknownIndexColumn {
                    table: table.to_string(),
                    index: index.name.clone(),
                    column: column.clone(),
                });
            }
        }
    }

    Ok(indexes)
}

fn index_columns<T: ToString>(columns: &[T]) -> Vec<String> {
    columns
        .iter()
        .map(|c| index_column_name(&c.to_string()))
        .collect()
}

fn check_primary_key(table: &str, indexes: &[Index]) -> Result<(), SchemaError> {
    let mut primaries = indexes.iter().filter(|i| i.is_primary_key);
    let Some(primary) = primaries.next() else {
        return Err(SchemaError::MissingPrimaryKey {
            table: table.to_string(),
        });
    };
    if primaries.next().is_some() {
        return Err(SchemaError::MultiplePrimaryKeys {
            table: table.to_string(),
        });
    }
    if primary.columns.len() > 1 {
        return Err(SchemaError::CompositePrimaryKey {
            table: table.to_string(),
            columns: primary.columns.join(", "),
        });
    }
    Ok(())
}

fn build_column(def: &ColumnDef, owning: &[&Index]) -> Result<Column, SchemaError> {
    let name = def.name.value.clone();
    let raw = RawColumnType::parse(&def.data_type.to_string(), &name)?;

    let mut column = Column {
        entity_type: infer_entity_type(&raw.keyword, raw.size, raw.unsigned, &name),
        column_type: raw.keyword,
        size: raw.size,
        is_auto_increment: false,
        is_unsigned: raw.unsigned,
        is_not_null: false,
        default_value: None,
        is_primary_key: false,
        unique_index_keys: Vec::new(),
        index_keys: Vec::new(),
        name,
    };

    for ColumnOptionDef { option, .. } in &def.options {
        match option {
            ColumnOption::NotNull => column.is_not_null = true,
            ColumnOption::Default(expr) => column.default_value = literal_default(expr),
            ColumnOption::DialectSpecific(_)
                if option.to_string().eq_ignore_ascii_case("auto_increment") =>
            {
                column.is_auto_increment = true;
            }
            _ => {}
        }
    }

    for index in owning {
        if index.is_primary_key {
            column.is_primary_key = true;
        } else if index.is_unique {
            column.unique_index_keys.push(index.name.clone());
        } else {
            column.index_keys.push(index.name.clone());
        }
    }

    Ok(column)
}

/// The literal default value, or `None` for `NULL` and non-literal expressions.
///
/// Quoted strings keep their unescaped contents: `'it''s'` -> `it's`.
fn literal_default(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Value(Value::Null) => None,
        Expr::Value(Value::SingleQuotedString(s) | Value::DoubleQuotedString(s)) => {
            Some(s.clone())
        }
        Expr::Value(_) | Expr::UnaryOp { .. } => Some(expr.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::type_inference::EntityType;

    const USERS_DDL: &str = "
CREATE TABLE IF NOT EXISTS users (
  id BIGINT(20) UNSIGNED NOT NULL AUTO_INCREMENT,
  uuid VARCHAR(40) NOT NULL,
  is_debug_user TINYINT(1) NOT NULL DEFAULT '0',
  created_at DATETIME,
  updated_at DATETIME,
  PRIMARY KEY (id),
  UNIQUE KEY `unique_key` (uuid),
  KEY `key` (is_debug_user)
);
";

    #[test]
    fn parses_columns_and_indexes() {
        let table = parse_table(USERS_DDL).unwrap();

        assert_eq!(table.name, "users");
        assert!(!table.is_read_only);
        assert_eq!(table.columns.len(), 5);
        assert_eq!(table.indexes.len(), 3);

        let id = &table.columns[0];
        assert_eq!(id.name, "id");
        assert_eq!(id.column_type, "bigint");
        assert_eq!(id.size, 20);
        assert!(id.is_primary_key);
        assert!(id.is_not_null);
        assert!(id.is_unsigned);
        assert!(id.is_auto_increment);
        assert_eq!(id.entity_type, EntityType::Uint64);

        let flag = &table.columns[2];
        assert_eq!(flag.name, "is_debug_user");
        assert_eq!(flag.entity_type, EntityType::Bool);
        assert_eq!(flag.default_value.as_deref(), Some("0"));
        assert_eq!(flag.index_keys, vec!["key".to_string()]);

        let uuid = &table.columns[1];
        assert_eq!(uuid.unique_index_keys, vec!["unique_key".to_string()]);
        assert!(uuid.index_keys.is_empty());

        assert_eq!(table.columns[3].entity_type, EntityType::TimePtr);
        assert_eq!(table.columns[3].default_value, None);

        let primary = &table.indexes[0];
        assert_eq!(primary.name, "PRIMARY");
        assert!(primary.is_primary_key);
        assert!(primary.is_unique);

        let unique = &table.indexes[1];
        assert_eq!(unique.name, "unique_key");
        assert!(!unique.is_primary_key);
        assert!(unique.is_unique);

        let key = &table.indexes[2];
        assert_eq!(key.name, "key");
        assert!(!key.is_unique);
    }

    #[test]
    fn null_default_is_absent() {
        let table = parse_table(
            "CREATE TABLE items (id INT NOT NULL, name VARCHAR(10) DEFAULT NULL, PRIMARY KEY (id));",
        )
        .unwrap();
        assert_eq!(table.columns[1].default_value, None);
        assert!(table.is_read_only);
    }

    #[test]
    fn inline_primary_key_is_an_index() {
        let table = parse_table("CREATE TABLE units (id INT PRIMARY KEY, name TEXT);").unwrap();
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(table.indexes[0].name, "PRIMARY");
        assert!(table.columns[0].is_primary_key);
    }

    #[test]
    fn schema_qualified_name_is_stripped() {
        let table =
            parse_table("CREATE TABLE game.items (id INT NOT NULL, PRIMARY KEY (id));").unwrap();
        assert_eq!(table.name, "items");
    }

    #[test]
    fn rejects_singular_table_name() {
        let err = parse_table("CREATE TABLE item (id INT, PRIMARY KEY (id));").unwrap_err();
        assert_eq!(
            err,
            SchemaError::SingularTableName {
                table: "item".to_string()
            }
        );
    }

    #[test]
    fn rejects_plural_index_column() {
        let err = parse_table("CREATE TABLE items (ids INT, PRIMARY KEY (ids));").unwrap_err();
        assert_eq!(
            err,
            SchemaError::PluralColumnName {
                table: "items".to_string(),
                column: "ids".to_string()
            }
        );
    }

    #[test]
    fn rejects_missing_and_composite_primary_keys() {
        assert!(matches!(
            parse_table("CREATE TABLE items (id INT, KEY `k` (id));").unwrap_err(),
            SchemaError::MissingPrimaryKey { .. }
        ));
        assert!(matches!(
            parse_table("CREATE TABLE items (id INT, kind INT, PRIMARY KEY (id, kind));")
                .unwrap_err(),
            SchemaError::CompositePrimaryKey { .. }
        ));
    }

    #[test]
    fn rejects_unknown_index_column() {
        let err = parse_table("CREATE TABLE items (id INT, PRIMARY KEY (code));").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownIndexColumn { .. }));
    }

    #[test]
    fn quoted_default_is_unescaped() {
        let table = parse_table(
            "CREATE TABLE items (id INT NOT NULL, note VARCHAR(10) DEFAULT 'it''s', \
             score INT DEFAULT -1, PRIMARY KEY (id));",
        )
        .unwrap();
        assert_eq!(table.columns[1].default_value.as_deref(), Some("it's"));
        assert_eq!(table.columns[2].default_value.as_deref(), Some("-1"));
    }

    #[test]
    fn rejects_duplicate_column() {
        let err = parse_table("CREATE TABLE items (id INT, id INT, PRIMARY KEY (id));")
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateColumn {
                table: "items".to_string(),
                column: "id".to_string()
            }
        );
    }

    #[test]
    fn rejects_multiple_primary_keys() {
        let err = parse_table("CREATE TABLE items (id INT PRIMARY KEY, PRIMARY KEY (id));")
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MultiplePrimaryKeys {
                table: "items".to_string()
            }
        );
    }

    #[test]
    fn inline_unique_is_an_index() {
        let table = parse_table(
            "CREATE TABLE items (id INT NOT NULL, code VARCHAR(16) UNIQUE, PRIMARY KEY (id));",
        )
        .unwrap();

        let code_index = table.indexes.iter().find(|i| i.name == "code").unwrap();
        assert!(code_index.is_unique);
        assert!(!code_index.is_primary_key);
        assert_eq!(code_index.columns, vec!["code".to_string()]);
        assert_eq!(table.column("code").unwrap().unique_index_keys, vec!["code".to_string()]);
    }

    #[test]
    fn irregular_plural_table_names_are_accepted() {
        for name in ["people", "children", "user_people"] {
            let table =
                parse_table(&format!("CREATE TABLE {name} (id INT NOT NULL, PRIMARY KEY (id));"))
                    .unwrap();
            assert_eq!(table.name, name);
        }
        for name in ["person", "child"] {
            let err =
                parse_table(&format!("CREATE TABLE {name} (id INT NOT NULL, PRIMARY KEY (id));"))
                    .unwrap_err();
            assert!(matches!(err, SchemaError::SingularTableName { .. }), "{name}: {err}");
        }
    }

    #[test]
    fn rejects_irregular_plural_index_column() {
        let err = parse_table(
            "CREATE TABLE items (id INT NOT NULL, people INT, PRIMARY KEY (id), KEY (people));",
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::PluralColumnName {
                table: "items".to_string(),
                column: "people".to_string()
            }
        );
    }

    #[test]
    fn parse_is_idempotent() {
        assert_eq!(parse_table(USERS_DDL).unwrap(), parse_table(USERS_DDL).unwrap());
    }
}
