pub use sqlparser::ast::{
    ColumnDef, ColumnOption, CreateTable, Statement, TableConstraint,
};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use crate::error::SchemaError;

/// Convenience: parse one MySQL `CREATE TABLE` statement.
pub fn parse_create_table(sql: &str) -> Result<CreateTable, SchemaError> {
    let mut statements =
        Parser::parse_sql(&MySqlDialect {}, sql).map_err(|e| SchemaError::Syntax {
            message: e.to_string(),
        })?;

    if statements.len() != 1 {
        return Err(SchemaError::NotSingleStatement {
            count: statements.len(),
        });
    }

    match statements.remove(0) {
        Statement::CreateTable(create) => Ok(create),
        _ => Err(SchemaError::NotCreateTable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mysql_create_table() {
        let create = parse_create_table(
            "CREATE TABLE IF NOT EXISTS `items` (\
             `id` BIGINT(20) UNSIGNED NOT NULL AUTO_INCREMENT, \
             PRIMARY KEY (`id`)) ENGINE=InnoDB;",
        )
        .unwrap();
        assert_eq!(create.columns.len(), 1);
        assert_eq!(create.constraints.len(), 1);
    }

    #[test]
    fn rejects_other_statements() {
        assert_eq!(
            parse_create_table("DROP TABLE items;").unwrap_err(),
            SchemaError::NotCreateTable
        );
    }

    #[test]
    fn rejects_multiple_statements() {
        let err = parse_create_table(
            "CREATE TABLE items (id INT, PRIMARY KEY (id)); CREATE TABLE units (id INT, PRIMARY KEY (id));",
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::NotSingleStatement { count: 2 });
    }

    #[test]
    fn reports_syntax_errors() {
        assert!(matches!(
            parse_create_table("CREATE TABLE (").unwrap_err(),
            SchemaError::Syntax { .. }
        ));
    }
}
