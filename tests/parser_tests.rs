mod support;

use ddl2dao::error::{Error, SchemaError};
use ddl2dao::parser::table_builder::parse_table;
use ddl2dao::parser::type_inference::{infer_entity_type, EntityType};
use ddl2dao::schema::Tables;

use support::{example_table, example_tables, fixture_dir, read_fixture_sql, unique_temp_dir};

#[test]
fn parse_is_idempotent() {
    let sql = read_fixture_sql("example", "user_friends");
    assert_eq!(parse_table(&sql).unwrap(), parse_table(&sql).unwrap());
}

#[test]
fn parse_example_items_columns() {
    let items = example_table("items");

    assert_eq!(items.name, "items");
    assert!(items.is_read_only);
    let names: Vec<&str> = items.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "type", "rarity"]);

    let id = items.column("id").unwrap();
    assert_eq!(id.column_type, "bigint");
    assert_eq!(id.entity_type, EntityType::Uint64);
    assert_eq!(id.size, 20);
    assert!(id.is_unsigned);
    assert!(id.is_primary_key);

    assert_eq!(items.column("type").unwrap().index_keys, vec!["type"]);
    assert!(items.column("name").unwrap().index_keys.is_empty());
}

#[test]
fn parse_example_indexes_in_declaration_order() {
    let friends = example_table("user_friends");

    let indexes: Vec<(&str, bool, bool)> = friends
        .indexes
        .iter()
        .map(|i| (i.name.as_str(), i.is_primary_key, i.is_unique))
        .collect();
    assert_eq!(
        indexes,
        vec![("PRIMARY", true, true), ("uniq_friend", false, true)]
    );
    assert_eq!(friends.indexes[1].columns, vec!["user_id", "other_user_id"]);
    assert_eq!(
        friends.column("other_user_id").unwrap().unique_index_keys,
        vec!["uniq_friend"]
    );
    assert!(!friends.is_read_only);
}

#[test]
fn parse_example_defaults_and_flags() {
    let users = example_table("users");
    let name = users.column("name").unwrap();
    assert_eq!(name.default_value.as_deref(), Some(""));
    assert!(name.is_not_null);

    let id = users.column("id").unwrap();
    assert!(id.is_auto_increment);
    assert_eq!(id.default_value, None);

    let units = example_table("units");
    let limited = units.column("is_limited").unwrap();
    assert_eq!(limited.entity_type, EntityType::Bool);
    assert_eq!(limited.default_value.as_deref(), Some("0"));
}

#[test]
fn type_inference_cases() {
    assert_eq!(infer_entity_type("tinyint", 1, false, "is_active"), EntityType::Bool);
    assert_eq!(infer_entity_type("tinyint", 1, false, "rank"), EntityType::Int8);
    assert_eq!(infer_entity_type("bigint", 0, true, "id"), EntityType::Uint64);
    assert_eq!(infer_entity_type("varchar", 255, false, "name"), EntityType::String);
    assert_eq!(infer_entity_type("datetime", 0, false, "created_at"), EntityType::TimePtr);
    assert_eq!(infer_entity_type("geometry", 0, false, "area"), EntityType::String);
}

#[test]
fn singular_table_name_is_rejected() {
    let err = parse_table("CREATE TABLE item (id BIGINT UNSIGNED NOT NULL, PRIMARY KEY (id));")
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::SingularTableName {
            table: "item".to_string()
        }
    );
}

#[test]
fn plural_index_column_is_rejected() {
    let err = parse_table(
        "CREATE TABLE items (id BIGINT UNSIGNED NOT NULL, ids VARCHAR(255), \
         PRIMARY KEY (id), KEY `ids` (ids));",
    )
    .unwrap_err();
    assert!(
        matches!(err, SchemaError::PluralColumnName { ref column, .. } if column == "ids"),
        "unexpected error: {err}"
    );
}

#[test]
fn load_dir_reads_every_fixture_sorted() {
    let tables = example_tables();
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["items", "units", "user_bytes", "user_friends", "users"]
    );
}

#[test]
fn load_dir_fails_fast_naming_the_file() {
    let err = Tables::load_dir(&fixture_dir("broken")).unwrap_err();

    let Error::Table { path, source } = &err else {
        panic!("expected a table error, got {err}");
    };
    assert!(path.ends_with("02_item.sql"), "unexpected path {}", path.display());
    assert!(matches!(source, SchemaError::SingularTableName { .. }));
    assert!(err.to_string().contains("02_item.sql"));
}

#[test]
fn load_dir_reports_missing_directory() {
    let err = Tables::load_dir(&fixture_dir("does_not_exist")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "unexpected error: {err}");
}

#[test]
fn schema_store_round_trips_through_disk() {
    let tables = example_tables();
    let dir = unique_temp_dir("ddl2dao_schema_store");

    tables.save(&dir).unwrap();
    let restored = Tables::load(&dir).unwrap();
    assert_eq!(restored, tables);
}
