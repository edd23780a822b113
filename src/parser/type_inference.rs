//! Column type classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Language-neutral value type of a column.
///
/// Synthesizers only ever see this type; the SQL spelling stays in
/// [`RawColumnType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// UTF-8 text.
    String,
    /// Boolean flag.
    Bool,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// Single-precision float.
    Float32,
    /// Double-precision float.
    Float64,
    /// Timestamp that may be absent.
    TimePtr,
    /// Raw bytes.
    ByteSlice,
    /// Sequence of strings (`SET` members).
    StringSlice,
}

impl EntityType {
    /// True for integer types of either signedness.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
        )
    }

    /// True when values can be compared with `==`.
    ///
    /// Sequence types cannot, so filter operations skip them.
    pub fn is_comparable(self) -> bool {
        !matches!(self, Self::ByteSlice | Self::StringSlice)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::TimePtr => "time_ptr",
            Self::ByteSlice => "byte_slice",
            Self::StringSlice => "string_slice",
        };
        f.write_str(name)
    }
}

/// Map a raw SQL column type onto an [`EntityType`].
///
/// Unknown types fall back to [`EntityType::String`].
pub fn infer_entity_type(raw_type: &str, size: u64, unsigned: bool, column_name: &str) -> EntityType {
    let pick = |signed: EntityType, unsigned_type: EntityType| {
        if unsigned {
            unsigned_type
        } else {
            signed
        }
    };

    match raw_type.to_ascii_lowercase().as_str() {
        "bigint" => pick(EntityType::Int64, EntityType::Uint64),
        "mediumint" | "int" | "integer" => pick(EntityType::Int32, EntityType::Uint32),
        "smallint" => pick(EntityType::Int16, EntityType::Uint16),
        "tinyint" => {
            if size == 1 && (column_name.starts_with("is_") || column_name.starts_with("has_")) {
                EntityType::Bool
            } else {
                pick(EntityType::Int8, EntityType::Uint8)
            }
        }
        "float" => EntityType::Float32,
        "double" | "decimal" | "numeric" | "real" => EntityType::Float64,
        "bit" => {
            if size > 32 {
                EntityType::Uint64
            } else if size > 16 {
                EntityType::Uint32
            } else if size > 8 {
                EntityType::Uint16
            } else {
                EntityType::Uint8
            }
        }
        "date" | "datetime" | "timestamp" | "time" | "year" => EntityType::TimePtr,
        "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
            EntityType::ByteSlice
        }
        "set" => EntityType::StringSlice,
        _ => EntityType::String,
    }
}

/// A SQL column type decoded from its rendered form, e.g. `BIGINT(20) UNSIGNED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumnType {
    /// Lower-case type keyword (`bigint`, `varchar`, ...).
    pub keyword: String,
    /// First numeric modifier, 0 when absent.
    pub size: u64,
    /// Whether `UNSIGNED` was present.
    pub unsigned: bool,
}

impl RawColumnType {
    /// Decode a rendered SQL type for the column `column`.
    pub fn parse(rendered: &str, column: &str) -> Result<Self, SchemaError> {
        let rendered = rendered.trim();
        let keyword_end = rendered
            .find(|ch: char| ch == '(' || ch.is_ascii_whitespace())
            .unwrap_or(rendered.len());
        let keyword = rendered[..keyword_end].to_ascii_lowercase();

        // ENUM and SET modifiers are member lists, not sizes.
        let size = match modifier_list(rendered) {
            Some(_) if matches!(keyword.as_str(), "enum" | "set") => 0,
            Some(list) => parse_size(list, column)?,
            None => 0,
        };

        let unsigned = rendered
            .split(|ch: char| ch.is_ascii_whitespace() || ch == ')')
            .any(|word| word.eq_ignore_ascii_case("unsigned"));

        Ok(Self {
            keyword,
            size,
            unsigned,
        })
    }
}

/// The text between the first `(` and its matching `)`.
fn modifier_list(rendered: &str) -> Option<&str> {
    let open = rendered.find('(')?;
    let mut depth = 0usize;
    let mut in_quote = false;
    for (idx, ch) in rendered[open..].char_indices() {
        match ch {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rendered[open + 1..open + idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_size(list: &str, column: &str) -> Result<u64, SchemaError> {
    let first = list.split(',').next().unwrap_or_default().trim();
    if first.is_empty() || first.starts_with('\'') || first.starts_with('"') {
        return Ok(0);
    }
    first
        .parse::<u64>()
        .map_err(|_| SchemaError::InvalidTypeModifier {
            column: column.to_string(),
            modifier: first.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tinyint_one_with_flag_prefix_is_bool() {
        assert_eq!(infer_entity_type("tinyint", 1, false, "is_active"), EntityType::Bool);
        assert_eq!(infer_entity_type("tinyint", 1, true, "has_item"), EntityType::Bool);
        assert_eq!(infer_entity_type("tinyint", 1, false, "rank"), EntityType::Int8);
        assert_eq!(infer_entity_type("tinyint", 4, false, "is_active"), EntityType::Int8);
        assert_eq!(infer_entity_type("tinyint", 1, true, "rank"), EntityType::Uint8);
    }

    #[test]
    fn integer_widths_follow_signedness() {
        assert_eq!(infer_entity_type("bigint", 20, true, "id"), EntityType::Uint64);
        assert_eq!(infer_entity_type("bigint", 20, false, "id"), EntityType::Int64);
        assert_eq!(infer_entity_type("mediumint", 0, false, "n"), EntityType::Int32);
        assert_eq!(infer_entity_type("int", 11, true, "n"), EntityType::Uint32);
        assert_eq!(infer_entity_type("smallint", 0, true, "n"), EntityType::Uint16);
    }

    #[test]
    fn bit_rounds_up_to_unsigned_width() {
        assert_eq!(infer_entity_type("bit", 1, false, "b"), EntityType::Uint8);
        assert_eq!(infer_entity_type("bit", 8, false, "b"), EntityType::Uint8);
        assert_eq!(infer_entity_type("bit", 9, false, "b"), EntityType::Uint16);
        assert_eq!(infer_entity_type("bit", 17, false, "b"), EntityType::Uint32);
        assert_eq!(infer_entity_type("bit", 33, false, "b"), EntityType::Uint64);
    }

    #[test]
    fn non_integer_families() {
        assert_eq!(infer_entity_type("float", 0, false, "x"), EntityType::Float32);
        assert_eq!(infer_entity_type("decimal", 10, false, "x"), EntityType::Float64);
        assert_eq!(infer_entity_type("datetime", 0, false, "x"), EntityType::TimePtr);
        assert_eq!(infer_entity_type("year", 0, false, "x"), EntityType::TimePtr);
        assert_eq!(infer_entity_type("varbinary", 16, false, "x"), EntityType::ByteSlice);
        assert_eq!(infer_entity_type("set", 0, false, "x"), EntityType::StringSlice);
        assert_eq!(infer_entity_type("varchar", 40, false, "x"), EntityType::String);
        assert_eq!(infer_entity_type("geometry", 0, false, "x"), EntityType::String);
    }

    #[test]
    fn raw_type_decodes_size_and_unsigned() {
        let raw = RawColumnType::parse("BIGINT(20) UNSIGNED", "id").unwrap();
        assert_eq!(raw.keyword, "bigint");
        assert_eq!(raw.size, 20);
        assert!(raw.unsigned);

        let raw = RawColumnType::parse("DECIMAL(10,2)", "price").unwrap();
        assert_eq!(raw.keyword, "decimal");
        assert_eq!(raw.size, 10);
        assert!(!raw.unsigned);

        let raw = RawColumnType::parse("DATETIME", "created_at").unwrap();
        assert_eq!(raw.size, 0);
    }

    #[test]
    fn raw_type_ignores_quoted_members() {
        let raw = RawColumnType::parse("ENUM('a', 'b)')", "kind").unwrap();
        assert_eq!(raw.keyword, "enum");
        assert_eq!(raw.size, 0);
    }

    #[test]
    fn raw_type_rejects_non_numeric_modifier() {
        let err = RawColumnType::parse("VARCHAR(abc)", "name").unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidTypeModifier {
                column: "name".to_string(),
                modifier: "abc".to_string(),
            }
        );
    }
}
