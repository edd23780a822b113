//! Deterministic name transforms shared by every synthesizer.
//!
//! All column-derived identifiers go through [`field_name`] and
//! [`plural_field_name`], so the `Id` → `ID` acronym rule and the `IDs`
//! plural exception live only here.

use convert_case::{Case, Casing};
use pluralizer::pluralize;

/// English plural of `noun` (`rarity` -> `rarities`, `child` -> `children`).
///
/// Only the last `_` segment is inflected: `user_person` -> `user_people`.
pub fn plural(noun: &str) -> String {
    inflect_last_segment(noun, 2)
}

/// English singular of `noun` (`user_bytes` -> `user_byte`, `people` -> `person`).
pub fn singular(noun: &str) -> String {
    inflect_last_segment(noun, 1)
}

/// True when `noun` is already in plural form.
pub fn is_plural(noun: &str) -> bool {
    let lower = noun.to_ascii_lowercase();
    plural(&lower) == lower
}

/// True when `noun` is already in singular form.
pub fn is_singular(noun: &str) -> bool {
    let lower = noun.to_ascii_lowercase();
    singular(&lower) == lower
}

fn inflect_last_segment(noun: &str, count: isize) -> String {
    match noun.rsplit_once('_') {
        Some((head, last)) if !last.is_empty() => {
            format!("{head}_{}", pluralize(last, count, false))
        }
        _ => pluralize(noun, count, false),
    }
}

/// `snake_case` column name to a `PascalCase` field name with `ID` acronyms.
///
/// `user_id` -> `UserID`, `is_debug_user` -> `IsDebugUser`.
pub fn field_name(column: &str) -> String {
    acronym_id(pascal(column))
}

/// Field name used for sequence-valued accessors of `column`.
///
/// `…ID` fields take a literal `s` (`UserIDs`); everything else is
/// pluralized as an English noun (`rarity` -> `Rarities`).
pub fn plural_field_name(column: &str) -> String {
    let field = field_name(column);
    if field.ends_with("ID") {
        return format!("{field}s");
    }
    acronym_id(pascal(&plural(column)))
}

/// `lowerCamelCase` name used by read-only serialization tags.
pub fn serial_name(column: &str) -> String {
    column.to_case(Case::Camel)
}

/// Entity type name for a table: `user_bytes` -> `UserByte`.
pub fn entity_name(table: &str) -> String {
    pascal(&singular(table))
}

/// Collection type name for a table: `user_bytes` -> `UserBytes`.
pub fn collection_name(table: &str) -> String {
    pascal(table)
}

/// Field holding a table's data-access object: `user_bytes` -> `userByteDao`.
pub fn dao_field_name(table: &str) -> String {
    format!("{}Dao", singular(table).to_case(Case::Camel))
}

fn pascal(snake: &str) -> String {
    snake.to_case(Case::Pascal)
}

fn acronym_id(field: String) -> String {
    match field.strip_suffix("Id") {
        Some(stem) => format!("{stem}ID"),
        None => field,
    }
}
