use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::generator::dao::synthesize_dao;
use crate::generator::entity::{structables_source, synthesize_entity};
use crate::generator::ir::SourceFile;
use crate::generator::model::synthesize_model;
use crate::generator::{Target, DAO_PACKAGE, ENTITY_PACKAGE, MODEL_PACKAGE};
use crate::output::go::Renderer;
use crate::output::report;
use crate::schema::Tables;

/// Directory (under the output root) holding the serialized schema.
pub const SCHEMA_DIR: &str = "schema";
/// File name of the Markdown report.
pub const REPORT_FILE: &str = "report.md";
/// Base name of the generated structable registry.
pub const STRUCTABLES_NAME: &str = "structables";

/// Write `contents` to `dir/name`, creating `dir` when needed.
pub fn write_output(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    validate_output_name(name)?;
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let path = dir.join(name);
    std::fs::write(&path, contents).map_err(|e| Error::io(&path, e))?;
    tracing::debug!(bytes = contents.len(), "wrote {}", path.display());
    Ok(path)
}

/// Render `file` and write it as `dir/<stem>.<ext>`.
pub fn write_source(
    dir: &Path,
    stem: &str,
    file: &SourceFile,
    renderer: &dyn Renderer,
) -> Result<PathBuf> {
    let name = format!("{stem}.{}", renderer.extension());
    write_output(dir, &name, &renderer.render(file))
}

/// Write one entity file per table plus the structable registry.
pub fn write_entities(
    root: &Path,
    tables: &Tables,
    target: &Target,
    renderer: &dyn Renderer,
) -> Result<Vec<PathBuf>> {
    let dir = root.join(ENTITY_PACKAGE);
    let entities: Vec<_> = tables.iter().map(synthesize_entity).collect();

    let mut written = Vec::with_capacity(entities.len() + 1);
    for entity in &entities {
        written.push(write_source(
            &dir,
            &entity.table_name,
            &entity.to_source(target),
            renderer,
        )?);
    }
    written.push(write_source(
        &dir,
        STRUCTABLES_NAME,
        &structables_source(&entities, target),
        renderer,
    )?);
    Ok(written)
}

/// Write one data-access file per table.
pub fn write_daos(
    root: &Path,
    tables: &Tables,
    target: &Target,
    renderer: &dyn Renderer,
) -> Result<Vec<PathBuf>> {
    let dir = root.join(DAO_PACKAGE);
    tables
        .iter()
        .map(|table| {
            let dao = synthesize_dao(table)?;
            write_source(&dir, &table.name, &dao.to_source(target), renderer)
        })
        .collect()
}

/// Write one model file per table.
pub fn write_models(
    root: &Path,
    tables: &Tables,
    target: &Target,
    renderer: &dyn Renderer,
) -> Result<Vec<PathBuf>> {
    let dir = root.join(MODEL_PACKAGE);
    tables
        .iter()
        .map(|table| {
            let model = synthesize_model(table)?;
            write_source(&dir, &table.name, &model.to_source(target), renderer)
        })
        .collect()
}

/// Persist the schema as `schema/tables.yaml`.
pub fn write_schema(root: &Path, tables: &Tables) -> Result<PathBuf> {
    let dir = root.join(SCHEMA_DIR);
    tables.save(&dir)?;
    Ok(dir.join(crate::schema::store::SCHEMA_FILE))
}

/// Write `report.md`.
pub fn write_report(root: &Path, tables: &Tables) -> Result<PathBuf> {
    write_output(root, REPORT_FILE, &report::build_report(tables))
}

/// Write every artifact: schema, entities, data-access objects, models and
/// the report.
pub fn write_all(
    root: &Path,
    tables: &Tables,
    target: &Target,
    renderer: &dyn Renderer,
) -> Result<Vec<PathBuf>> {
    let mut written = vec![write_schema(root, tables)?];
    written.extend(write_entities(root, tables, target, renderer)?);
    written.extend(write_daos(root, tables, target, renderer)?);
    written.extend(write_models(root, tables, target, renderer)?);
    written.push(write_report(root, tables)?);
    Ok(written)
}

fn validate_output_name(name: &str) -> Result<()> {
    let reject = |reason| {
        Err(Error::InvalidOutputName {
            name: name.to_string(),
            reason,
        })
    };
    if name.trim().is_empty() {
        return reject("must not be empty");
    }
    let candidate = Path::new(name);
    if candidate.is_absolute() {
        return reject("absolute paths are not allowed");
    }
    if candidate.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    }) {
        return reject("traversal segments are not allowed");
    }
    if name.contains('/') || name.contains('\\') {
        return reject("path separators are not allowed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::go::GoRenderer;
    use crate::parser::table_builder::parse_table;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_path(prefix: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!("{prefix}_{nanos}"))
    }

    fn items() -> Tables {
        let table = parse_table(
            "CREATE TABLE items (id BIGINT UNSIGNED NOT NULL, name VARCHAR(255) NOT NULL, \
             PRIMARY KEY (id));",
        )
        .expect("items DDL should parse");
        std::iter::once(table).collect()
    }

    #[test]
    fn write_output_reports_directory_creation_errors() {
        let path = unique_path("ddl2dao_formatter_file");
        std::fs::write(&path, "not a directory").expect("should create marker file");

        let err = write_output(&path, "items.go", "package entity")
            .expect_err("directory creation should fail");
        assert!(matches!(err, Error::Io { .. }), "unexpected error: {err}");
    }

    #[test]
    fn write_output_rejects_unsafe_name_paths() {
        let dir = unique_path("ddl2dao_formatter_dir");

        for name in ["nested/items.go", "../escape.go", "/etc/passwd", " "] {
            let err = write_output(&dir, name, "").expect_err("unsafe output name should fail");
            assert!(
                matches!(err, Error::InvalidOutputName { .. }),
                "unexpected error for {name}: {err}"
            );
        }
    }

    #[test]
    fn write_all_lays_out_packages() {
        let dir = unique_path("ddl2dao_formatter_ok");
        let written = write_all(&dir, &items(), &Target::new("example"), &GoRenderer)
            .expect("write_all should succeed");

        for relative in [
            "schema/tables.yaml",
            "entity/items.go",
            "entity/structables.go",
            "dao/items.go",
            "model/items.go",
            "report.md",
        ] {
            assert!(written.contains(&dir.join(relative)), "missing {relative}");
            assert!(dir.join(relative).is_file(), "{relative} was not written");
        }

        let dao = std::fs::read_to_string(dir.join("dao/items.go")).expect("dao file should exist");
        assert!(dao.starts_with("package dao\n"));
        assert!(dao.contains("\"example/entity\""));
    }
}
