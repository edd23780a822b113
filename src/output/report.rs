use std::fmt::Write;

use crate::convention::TableConvention;
use crate::generator::finder::{synthesize_find_methods, Arity, FindMethod, Lookup};
use crate::schema::{Table, Tables};

/// Build a markdown report listing every table's convention and finders.
pub fn build_report(tables: &Tables) -> String {
    let mut report = String::new();

    writeln!(report, "# ddl2dao Generation Report").unwrap();
    writeln!(report).unwrap();

    writeln!(report, "## Tables").unwrap();
    writeln!(report).unwrap();
    writeln!(report, "| Table | Convention | Columns | Indexes | Finders |").unwrap();
    writeln!(report, "|-------|------------|---------|---------|---------|").unwrap();

    for table in tables {
        writeln!(
            report,
            "| {} | {} | {} | {} | {} |",
            table.name,
            format_convention(table.convention()),
            table.columns.len(),
            table.indexes.len(),
            synthesize_find_methods(table).len()
        )
        .unwrap();
    }

    for table in tables {
        write_finders(&mut report, table);
    }

    report
}

fn write_finders(report: &mut String, table: &Table) {
    writeln!(report).unwrap();
    writeln!(report, "## {}", table.name).unwrap();
    writeln!(report).unwrap();

    let methods = synthesize_find_methods(table);
    if methods.is_empty() {
        writeln!(report, "No finders.").unwrap();
        return;
    }
    for method in &methods {
        writeln!(report, "- `{}` {}", format_signature(method), format_notes(method)).unwrap();
    }
}

fn format_convention(convention: TableConvention) -> &'static str {
    match convention {
        TableConvention::ReadOnly => "read-only",
        TableConvention::Mutable => "mutable",
        TableConvention::UserScoped => "user-scoped",
    }
}

fn format_signature(method: &FindMethod) -> String {
    let args: Vec<String> = method
        .args
        .iter()
        .map(|arg| {
            if arg.is_sequence {
                format!("{} []{}", arg.name, arg.entity_type)
            } else {
                format!("{} {}", arg.name, arg.entity_type)
            }
        })
        .collect();
    format!("{}({})", method.name, args.join(", "))
}

fn format_notes(method: &FindMethod) -> String {
    let arity = match method.arity {
        Arity::Single => "single",
        Arity::Collection => "collection",
    };
    let lookup = match method.lookup {
        Lookup::Eq => "eq",
        Lookup::In => "in",
    };
    let mut notes = format!("({arity}, {lookup} on {}", method.columns.join(", "));
    if method.is_user_scoped() {
        notes.push_str("; scoped to current user");
    }
    notes.push(')');
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::table_builder::parse_table;

    fn tables(ddls: &[&str]) -> Tables {
        ddls.iter()
            .map(|ddl| parse_table(ddl).expect("fixture DDL should parse"))
            .collect()
    }

    #[test]
    fn report_lists_tables_and_conventions() {
        let report = build_report(&tables(&[
            "CREATE TABLE users (id BIGINT UNSIGNED NOT NULL, name VARCHAR(255), PRIMARY KEY (id));",
            "CREATE TABLE user_bytes (id BIGINT UNSIGNED NOT NULL, user_id BIGINT UNSIGNED NOT NULL, PRIMARY KEY (id), KEY (user_id));",
        ]));

        assert!(report.starts_with("# ddl2dao Generation Report"));
        assert!(report.contains("| users | mutable | 2 | 1 | 2 |"));
        assert!(report.contains("| user_bytes | user-scoped | 2 | 2 |"));
        assert!(report.contains("## user_bytes"));
        assert!(report.contains("- `Find()` (collection, eq on user_id; scoped to current user)"));
    }

    #[test]
    fn sequence_arguments_render_as_slices() {
        let report = build_report(&tables(&[
            "CREATE TABLE items (id BIGINT UNSIGNED NOT NULL, PRIMARY KEY (id));",
        ]));
        assert!(report.contains("- `FindByID(k0 uint64)` (single, eq on id)"));
        assert!(report.contains("- `FindByIDs(k0 []uint64)` (collection, in on id)"));
    }
}
