//! Derivation of the lookup methods a data-access object exposes.
//!
//! Every index contributes one `FindBy…` method per column prefix, plus an
//! IN-lookup for single-column prefixes. `user_id` never appears as an
//! argument: user-scoped lookups take the owner from the data-access object's
//! user-identity supplier instead.

use std::collections::HashSet;

use serde::Serialize;

use crate::convention::USER_ID_COLUMN;
use crate::naming;
use crate::parser::type_inference::EntityType;
use crate::schema::{Column, Index, Table};

/// Whether a lookup yields at most one entity or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// Zero or one entity.
    Single,
    /// Any number of entities.
    Collection,
}

/// How the arguments are matched against columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup {
    /// One value per lookup column, combined with AND.
    Eq,
    /// One sequence argument matched with `IN` against a single column.
    In,
}

/// One typed argument of a finder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinderArg {
    /// Positional parameter name (`k0`, `k1`, …).
    pub name: String,
    /// Column the argument is compared with.
    pub column: String,
    /// Element type of the argument.
    pub entity_type: EntityType,
    /// The argument is a sequence of `entity_type` values.
    pub is_sequence: bool,
}

/// A synthesized lookup method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindMethod {
    /// Method name, e.g. `FindByTypeAndRarity`.
    pub name: String,
    /// Caller-supplied arguments.
    pub args: Vec<FinderArg>,
    /// Single or collection result.
    pub arity: Arity,
    /// Equality or IN lookup.
    pub lookup: Lookup,
    /// All lookup columns in index order, including an elided `user_id`.
    pub columns: Vec<String>,
}

impl FindMethod {
    /// True when the current user's id is part of the lookup.
    pub fn is_user_scoped(&self) -> bool {
        self.columns.iter().any(|c| c == USER_ID_COLUMN)
    }

    /// True when the method returns a collection.
    pub fn returns_collection(&self) -> bool {
        self.arity == Arity::Collection
    }
}

/// All finders for `table`, deduplicated by name in index declaration order.
///
/// User-scoped tables start with a zero-argument `Find` over `user_id`.
pub fn synthesize_find_methods(table: &Table) -> Vec<FindMethod> {
    let mut methods = Vec::new();
    if table.convention().is_user_scoped() {
        methods.push(user_find_method(table));
    }

    let mut seen: HashSet<String> = methods.iter().map(|m| m.name.clone()).collect();
    for index in &table.indexes {
        for method in index_find_methods(index, table) {
            if seen.insert(method.name.clone()) {
                methods.push(method);
            }
        }
    }
    methods
}

/// Finders contributed by a single index, before cross-index deduplication.
pub fn index_find_methods(index: &Index, table: &Table) -> Vec<FindMethod> {
    let columns: Vec<&Column> = index
        .columns
        .iter()
        .filter_map(|name| table.column(name))
        .collect();
    let width = columns.len();

    let mut methods = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    for (position, column) in columns.iter().enumerate() {
        if column.name == USER_ID_COLUMN {
            continue;
        }
        fields.push(naming::field_name(&column.name));

        let prefix = &columns[..=position];
        let arity = if index.is_unique && prefix.len() == width {
            Arity::Single
        } else {
            Arity::Collection
        };
        methods.push(FindMethod {
            name: format!("FindBy{}", fields.join("And")),
            args: prefix
                .iter()
                .filter(|c| c.name != USER_ID_COLUMN)
                .enumerate()
                .map(|(k, c)| FinderArg {
                    name: format!("k{k}"),
                    column: c.name.clone(),
                    entity_type: c.entity_type,
                    is_sequence: false,
                })
                .collect(),
            arity,
            lookup: Lookup::Eq,
            columns: prefix.iter().map(|c| c.name.clone()).collect(),
        });

        if prefix.len() == 1 {
            methods.push(FindMethod {
                name: format!("FindBy{}", naming::plural_field_name(&column.name)),
                args: vec![FinderArg {
                    name: "k0".to_string(),
                    column: column.name.clone(),
                    entity_type: column.entity_type,
                    is_sequence: true,
                }],
                arity: Arity::Collection,
                lookup: Lookup::In,
                columns: vec![column.name.clone()],
            });
        }
    }
    methods
}

/// The zero-argument finder of a user-scoped table.
///
/// Returns a single entity when `user_id` alone is a unique key.
fn user_find_method(table: &Table) -> FindMethod {
    let unique_per_user = table.indexes.iter().any(|index| {
        index.is_unique && index.columns.len() == 1 && index.columns[0] == USER_ID_COLUMN
    });
    FindMethod {
        name: "Find".to_string(),
        args: Vec::new(),
        arity: if unique_per_user {
            Arity::Single
        } else {
            Arity::Collection
        },
        lookup: Lookup::Eq,
        columns: vec![USER_ID_COLUMN.to_string()],
    }
}
