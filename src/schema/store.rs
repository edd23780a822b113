//! YAML persistence of the schema model as `tables.yaml`.

use std::path::Path;

use crate::error::{Error, Result, SchemaError};
use crate::schema::Tables;

/// File name of the serialized schema inside a schema directory.
pub const SCHEMA_FILE: &str = "tables.yaml";

impl Tables {
    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Deserialize from YAML produced by [`Tables::to_yaml`].
    ///
    /// Rejects tables whose stored `is_read_only` disagrees with their name.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let tables: Self = serde_yaml::from_str(yaml)?;
        for table in &tables {
            let expected = table.convention().is_read_only();
            if table.is_read_only != expected {
                return Err(SchemaError::StaleReadOnlyFlag {
                    table: table.name.clone(),
                    stored: table.is_read_only,
                    expected,
                }
                .into());
            }
        }
        Ok(tables)
    }

    /// Write `tables.yaml` into `dir`, creating the directory if needed.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        let path = dir.join(SCHEMA_FILE);
        std::fs::write(&path, self.to_yaml()?).map_err(|e| Error::io(&path, e))?;
        tracing::debug!(tables = self.len(), "wrote {}", path.display());
        Ok(())
    }

    /// Read `tables.yaml` from `dir` without re-parsing any DDL.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SCHEMA_FILE);
        let yaml = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        Self::from_yaml(&yaml)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{Error, SchemaError};
    use crate::parser::table_builder::parse_table;
    use crate::schema::Tables;

    #[test]
    fn yaml_round_trip_preserves_every_field() {
        let table = parse_table(
            "CREATE TABLE user_items (
               id BIGINT(20) UNSIGNED NOT NULL AUTO_INCREMENT,
               user_id BIGINT(20) UNSIGNED NOT NULL,
               item_id BIGINT(20) UNSIGNED NOT NULL,
               amount INT(11) NOT NULL DEFAULT '1',
               tags SET('a','b'),
               created_at DATETIME,
               PRIMARY KEY (id),
               UNIQUE KEY `uniq_user_item` (user_id, item_id),
               KEY `item` (item_id)
             );",
        )
        .unwrap();
        let tables: Tables = std::iter::once(table).collect();

        let yaml = tables.to_yaml().unwrap();
        let restored = Tables::from_yaml(&yaml).unwrap();
        assert_eq!(restored, tables);
    }

    #[test]
    fn yaml_with_contradicting_read_only_flag_is_rejected() {
        let table = parse_table("CREATE TABLE items (id INT, PRIMARY KEY (id));").unwrap();
        let tables: Tables = std::iter::once(table).collect();
        let yaml = tables
            .to_yaml()
            .unwrap()
            .replace("is_read_only: true", "is_read_only: false");

        let err = Tables::from_yaml(&yaml).unwrap_err();
        assert!(
            matches!(
                err,
                Error::Schema(SchemaError::StaleReadOnlyFlag {
                    ref table,
                    stored: false,
                    expected: true,
                }) if table == "items"
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn yaml_uses_schema_field_names() {
        let table = parse_table("CREATE TABLE units (id INT, PRIMARY KEY (id));").unwrap();
        let tables: Tables = std::iter::once(table).collect();
        let yaml = tables.to_yaml().unwrap();
        for key in [
            "name:",
            "columns:",
            "indexes:",
            "is_read_only:",
            "entity_type:",
            "unique_index_keys:",
        ] {
            assert!(yaml.contains(key), "missing {key} in:\n{yaml}");
        }
    }
}
