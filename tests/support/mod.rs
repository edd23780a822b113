#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ddl2dao::parser::table_builder::parse_table;
use ddl2dao::schema::{Table, Tables};

pub(crate) fn fixture_dir(fixture: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(fixture)
}

pub(crate) fn read_fixture_sql(fixture: &str, table: &str) -> String {
    let path = fixture_dir(fixture).join(format!("{table}.sql"));
    std::fs::read_to_string(path).expect("fixture SQL should be readable")
}

/// Parse one table of the `example` fixture.
pub(crate) fn example_table(table: &str) -> Table {
    parse_table(&read_fixture_sql("example", table)).expect("fixture SQL should parse")
}

/// Every table of the `example` fixture, sorted by file name.
pub(crate) fn example_tables() -> Tables {
    Tables::load_dir(&fixture_dir("example")).expect("example fixture should load")
}

pub(crate) fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("{prefix}_{nanos}"));
    std::fs::create_dir_all(&path).expect("temp directory should be creatable");
    path
}
