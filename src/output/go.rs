//! Text rendering of the code IR.
//!
//! [`GoRenderer`] emits gofmt-style Go: tab indentation, grouped imports and
//! aligned struct fields and keyed literals.

use std::fmt::Write;

use crate::generator::ir::{
    BinOp, Expr, FieldDecl, FuncDecl, Item, Param, Signature, SourceFile, Stmt, TypeRef, UnaryOp,
};

/// Turns a [`SourceFile`] into source text.
pub trait Renderer {
    /// Render the whole file.
    fn render(&self, file: &SourceFile) -> String;
    /// File extension of rendered files, without the dot.
    fn extension(&self) -> &str;
}

/// Renders Go source.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoRenderer;

impl Renderer for GoRenderer {
    fn render(&self, file: &SourceFile) -> String {
        let mut out = String::new();
        writeln!(out, "package {}", file.package).unwrap();
        write_imports(&mut out, &file.imports);
        for item in &file.items {
            writeln!(out).unwrap();
            write_item(&mut out, item);
        }
        out
    }

    fn extension(&self) -> &str {
        "go"
    }
}

/// Name a package is referred to by: the last path segment.
fn package_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Standard-library paths have no dot in their first segment.
fn is_std_path(path: &str) -> bool {
    !path.split('/').next().unwrap_or(path).contains('.')
}

fn write_imports(out: &mut String, imports: &[String]) {
    match imports {
        [] => {}
        [single] => {
            writeln!(out).unwrap();
            writeln!(out, "import \"{single}\"").unwrap();
        }
        _ => {
            let (mut std, mut third_party): (Vec<&String>, Vec<&String>) =
                imports.iter().partition(|p| is_std_path(p));
            std.sort();
            third_party.sort();

            writeln!(out).unwrap();
            writeln!(out, "import (").unwrap();
            for path in &std {
                writeln!(out, "\t\"{path}\"").unwrap();
            }
            if !std.is_empty() && !third_party.is_empty() {
                writeln!(out).unwrap();
            }
            for path in &third_party {
                writeln!(out, "\t\"{path}\"").unwrap();
            }
            writeln!(out, ")").unwrap();
        }
    }
}

fn write_item(out: &mut String, item: &Item) {
    match item {
        Item::Struct(decl) => {
            if decl.fields.is_empty() {
                writeln!(out, "type {} struct{{}}", decl.name).unwrap();
                return;
            }
            writeln!(out, "type {} struct {{", decl.name).unwrap();
            for line in struct_fields(&decl.fields) {
                writeln!(out, "\t{line}").unwrap();
            }
            writeln!(out, "}}").unwrap();
        }
        Item::TypeAlias { name, ty } => {
            writeln!(out, "type {name} {}", type_ref(ty)).unwrap();
        }
        Item::Interface { name, methods } => {
            writeln!(out, "type {name} interface {{").unwrap();
            for method in methods {
                writeln!(out, "\t{}", signature(method)).unwrap();
            }
            writeln!(out, "}}").unwrap();
        }
        Item::Func(func) => write_func(out, func),
    }
}

/// Field lines, with names, types and tags aligned over runs of named
/// fields. Embedded fields break a run.
fn struct_fields(fields: &[FieldDecl]) -> Vec<String> {
    let mut lines = Vec::with_capacity(fields.len());
    let mut run: Vec<&FieldDecl> = Vec::new();
    for field in fields {
        if field.name.is_some() {
            run.push(field);
            continue;
        }
        lines.extend(aligned_fields(&run));
        run.clear();
        lines.push(type_ref(&field.ty));
    }
    lines.extend(aligned_fields(&run));
    lines
}

fn aligned_fields(run: &[&FieldDecl]) -> Vec<String> {
    let name_width = run
        .iter()
        .filter_map(|f| f.name.as_ref().map(String::len))
        .max()
        .unwrap_or(0);
    let types: Vec<String> = run.iter().map(|f| type_ref(&f.ty)).collect();
    let type_width = types.iter().map(String::len).max().unwrap_or(0);

    run.iter()
        .zip(types)
        .map(|(field, ty)| {
            let name = field.name.as_deref().unwrap_or_default();
            if field.tags.is_empty() {
                format!("{name:<name_width$} {ty}")
            } else {
                let tags: Vec<String> = field
                    .tags
                    .iter()
                    .map(|(key, value)| format!("{key}:\"{value}\""))
                    .collect();
                format!("{name:<name_width$} {ty:<type_width$} `{}`", tags.join(" "))
            }
        })
        .collect()
}

fn write_func(out: &mut String, func: &FuncDecl) {
    let receiver = func
        .receiver
        .as_ref()
        .map(|r| format!("({}) ", param(r)))
        .unwrap_or_default();
    writeln!(out, "func {receiver}{} {{", signature(&func.signature)).unwrap();
    write_block(out, &func.body, 1);
    writeln!(out, "}}").unwrap();
}

fn signature(sig: &Signature) -> String {
    format!(
        "{}({}){}",
        sig.name,
        params(&sig.params),
        results(&sig.results)
    )
}

fn param(p: &Param) -> String {
    format!("{} {}", p.name, type_ref(&p.ty))
}

fn params(list: &[Param]) -> String {
    list.iter().map(param).collect::<Vec<_>>().join(", ")
}

fn results(list: &[TypeRef]) -> String {
    match list {
        [] => String::new(),
        [single] => format!(" {}", type_ref(single)),
        many => format!(" ({})", type_list(many)),
    }
}

fn type_list(list: &[TypeRef]) -> String {
    list.iter().map(type_ref).collect::<Vec<_>>().join(", ")
}

fn type_ref(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Named(name) => name.clone(),
        TypeRef::Qualified { package, name } => format!("{}.{name}", package_name(package)),
        TypeRef::Pointer(inner) => format!("*{}", type_ref(inner)),
        TypeRef::Slice(inner) => format!("[]{}", type_ref(inner)),
        TypeRef::Map(key, value) => format!("map[{}]{}", type_ref(key), type_ref(value)),
        TypeRef::Func { params, results: res } => {
            format!("func({}){}", type_list(params), results(res))
        }
        TypeRef::Any => "interface{}".to_string(),
    }
}

fn indent(level: usize) -> String {
    "\t".repeat(level)
}

fn write_block(out: &mut String, body: &[Stmt], level: usize) {
    for stmt in body {
        write_stmt(out, stmt, level);
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, level: usize) {
    let pad = indent(level);
    match stmt {
        Stmt::If { init, cond, then } => {
            let init = init
                .as_ref()
                .map(|s| format!("{}; ", simple_stmt(s, level)))
                .unwrap_or_default();
            writeln!(out, "{pad}if {init}{} {{", expr(cond, level)).unwrap();
            write_block(out, then, level + 1);
            writeln!(out, "{pad}}}").unwrap();
        }
        Stmt::ForRange {
            key,
            value,
            over,
            body,
        } => {
            let key = key.as_deref().unwrap_or("_");
            writeln!(out, "{pad}for {key}, {value} := range {} {{", expr(over, level)).unwrap();
            write_block(out, body, level + 1);
            writeln!(out, "{pad}}}").unwrap();
        }
        Stmt::ForCount {
            var,
            start,
            end,
            body,
        } => {
            writeln!(
                out,
                "{pad}for {var} := {}; {var} < {}; {var}++ {{",
                expr(start, level),
                expr(end, level)
            )
            .unwrap();
            write_block(out, body, level + 1);
            writeln!(out, "{pad}}}").unwrap();
        }
        simple => writeln!(out, "{pad}{}", simple_stmt(simple, level)).unwrap(),
    }
}

/// Statements that fit on one line (apart from nested literals).
fn simple_stmt(stmt: &Stmt, level: usize) -> String {
    match stmt {
        Stmt::Expr(e) => expr(e, level),
        Stmt::Define(names, value) => format!("{} := {}", names.join(", "), expr(value, level)),
        Stmt::Assign(target, value) => format!("{} = {}", expr(target, level), expr(value, level)),
        Stmt::Var(name, ty) => format!("var {name} {}", type_ref(ty)),
        Stmt::Return(values) if values.is_empty() => "return".to_string(),
        Stmt::Return(values) => format!("return {}", expr_list(values, level)),
        compound => {
            // Compound statements never appear in init position.
            let mut nested = String::new();
            write_stmt(&mut nested, compound, level);
            nested.trim().to_string()
        }
    }
}

fn expr_list(values: &[Expr], level: usize) -> String {
    values
        .iter()
        .map(|v| expr(v, level))
        .collect::<Vec<_>>()
        .join(", ")
}

fn precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And => 2,
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Ge => 3,
    }
}

fn operator(op: BinOp) -> &'static str {
    match op {
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
    }
}

fn operand(e: &Expr, parent: u8, level: usize) -> String {
    match e {
        Expr::Binary(_, op, _) if precedence(*op) < parent => format!("({})", expr(e, level)),
        _ => expr(e, level),
    }
}

/// Render an expression whose first line continues a line at `level`.
fn expr(e: &Expr, level: usize) -> String {
    match e {
        Expr::Ident(name) => name.clone(),
        Expr::Qualified { package, name } => format!("{}.{name}", package_name(package)),
        Expr::Nil => "nil".to_string(),
        Expr::Str(value) => quote(value),
        Expr::Int(value) => value.to_string(),
        Expr::Type(ty) => type_ref(ty),
        Expr::Field(base, name) => format!("{}.{name}", expr(base, level)),
        Expr::Call(callee, args) => format!("{}({})", expr(callee, level), expr_list(args, level)),
        Expr::Index(base, index) => format!("{}[{}]", expr(base, level), expr(index, level)),
        Expr::Unary(op, inner) => {
            let symbol = match op {
                UnaryOp::Addr => "&",
                UnaryOp::Deref => "*",
                UnaryOp::Not => "!",
            };
            match inner.as_ref() {
                Expr::Binary(..) => format!("{symbol}({})", expr(inner, level)),
                _ => format!("{symbol}{}", expr(inner, level)),
            }
        }
        Expr::Binary(lhs, op, rhs) => {
            let p = precedence(*op);
            format!(
                "{} {} {}",
                operand(lhs, p, level),
                operator(*op),
                operand(rhs, p + 1, level)
            )
        }
        Expr::Paren(inner) => format!("({})", expr(inner, level)),
        Expr::Composite { ty, fields } => {
            let entries: Vec<(String, String)> = fields
                .iter()
                .map(|(key, value)| (key.clone(), expr(value, level + 1)))
                .collect();
            format!("{}{{{}}}", type_ref(ty), keyed_entries(&entries, level))
        }
        Expr::SliceLit { elem, elems } => {
            format!("[]{}{{{}}}", type_ref(elem), expr_list(elems, level))
        }
        Expr::MapLit {
            key,
            value,
            entries,
        } => {
            let entries: Vec<(String, String)> = entries
                .iter()
                .map(|(k, v)| (expr(k, level + 1), expr(v, level + 1)))
                .collect();
            format!(
                "map[{}]{}{{{}}}",
                type_ref(key),
                type_ref(value),
                keyed_entries(&entries, level)
            )
        }
        Expr::FuncLit {
            params: ps,
            results: rs,
            body,
        } => {
            let mut out = format!("func({}){} {{\n", params(ps), results(rs));
            write_block(&mut out, body, level + 1);
            out.push_str(&indent(level));
            out.push('}');
            out
        }
    }
}

/// Body of a keyed literal: one `key: value,` line per entry, values aligned
/// over runs of single-line entries.
fn keyed_entries(entries: &[(String, String)], level: usize) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let pad = indent(level + 1);
    let mut out = String::from("\n");
    let mut start = 0;
    while start < entries.len() {
        let single_line = |(_, v): &(String, String)| !v.contains('\n');
        if !single_line(&entries[start]) {
            let (key, value) = &entries[start];
            writeln!(out, "{pad}{key}: {value},").unwrap();
            start += 1;
            continue;
        }
        let end = entries[start..]
            .iter()
            .position(|e| !single_line(e))
            .map_or(entries.len(), |offset| start + offset);
        let width = entries[start..end]
            .iter()
            .map(|(k, _)| k.len() + 1)
            .max()
            .unwrap_or(0);
        for (key, value) in &entries[start..end] {
            let label = format!("{key}:");
            writeln!(out, "{pad}{label:<width$} {value},").unwrap();
        }
        start = end;
    }
    out.push_str(&indent(level));
    out
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ir::StructDecl;

    #[test]
    fn imports_group_standard_library_first() {
        let mut file = SourceFile::new("dao");
        file.import("go.knocknote.io/rapidash");
        file.import("time");
        file.import("example/entity");
        file.import("github.com/juju/errors");

        insta::assert_snapshot!(GoRenderer.render(&file), @r#"
package dao

import (
	"example/entity"
	"time"

	"github.com/juju/errors"
	"go.knocknote.io/rapidash"
)
"#);
    }

    #[test]
    fn struct_fields_align_and_embedded_fields_break_runs() {
        let mut file = SourceFile::new("model");
        file.push(Item::Struct(StructDecl {
            name: "ItemInstance".to_string(),
            fields: vec![
                FieldDecl::embedded(TypeRef::qualified("example/entity", "Item").pointer()),
                FieldDecl::named("itemDao", TypeRef::qualified("example/dao", "Item")),
                FieldDecl::named("id", TypeRef::named("uint64")),
            ],
        }));

        insta::assert_snapshot!(GoRenderer.render(&file), @r"
package model

type ItemInstance struct {
	*entity.Item
	itemDao dao.Item
	id      uint64
}
");
    }

    #[test]
    fn binary_operands_are_parenthesized_by_precedence() {
        let e = Expr::ident("a")
            .binary(BinOp::Or, Expr::ident("b"))
            .binary(BinOp::And, Expr::ident("c"));
        assert_eq!(expr(&e, 0), "(a || b) && c");

        let e = Expr::ident("idx")
            .binary(BinOp::Lt, Expr::Int(0))
            .binary(BinOp::Or, Expr::ident("idx").binary(BinOp::Ge, Expr::ident("n")));
        assert_eq!(expr(&e, 0), "idx < 0 || idx >= n");
    }

    #[test]
    fn keyed_literals_align_single_line_runs() {
        let map = Expr::MapLit {
            key: TypeRef::named("string"),
            value: TypeRef::Any,
            entries: vec![
                (Expr::str("other_user_id"), Expr::ident("e").field("OtherUserID")),
                (Expr::str("updated_at"), Expr::ident("e").field("UpdatedAt")),
            ],
        };
        assert_eq!(
            expr(&map, 1),
            "map[string]interface{}{\n\t\t\"other_user_id\": e.OtherUserID,\n\t\t\"updated_at\":    e.UpdatedAt,\n\t}"
        );
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(quote("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn extension_is_go() {
        assert_eq!(GoRenderer.extension(), "go");
    }
}
