//! Table-naming conventions that gate what the synthesizers produce.

use serde::Serialize;

/// Column holding the owning user of a user-scoped row.
pub const USER_ID_COLUMN: &str = "user_id";
/// Primary identifier column.
pub const ID_COLUMN: &str = "id";
/// Insert timestamp column, set once by `Save`.
pub const CREATED_AT_COLUMN: &str = "created_at";
/// Update timestamp column, refreshed by every `Save`.
pub const UPDATED_AT_COLUMN: &str = "updated_at";

const USERS_TABLE: &str = "users";
const USER_TABLE_PREFIX: &str = "user_";

/// How a table is accessed by generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableConvention {
    /// Master data: bulk reads and lookups only.
    ReadOnly,
    /// The `users` table itself: full create/update/delete surface.
    Mutable,
    /// `user_*` tables: mutable, with every row owned by one user.
    UserScoped,
}

impl TableConvention {
    /// Classify a table by name.
    pub fn resolve(table_name: &str) -> Self {
        if table_name.starts_with(USER_TABLE_PREFIX) {
            Self::UserScoped
        } else if table_name == USERS_TABLE {
            Self::Mutable
        } else {
            Self::ReadOnly
        }
    }

    /// No create/update/delete surface is generated.
    pub fn is_read_only(self) -> bool {
        self == Self::ReadOnly
    }

    /// Rows are implicitly filtered by the current user.
    pub fn is_user_scoped(self) -> bool {
        self == Self::UserScoped
    }
}

/// True when generated code must never write to `table_name`.
pub fn is_read_only_table(table_name: &str) -> bool {
    TableConvention::resolve(table_name).is_read_only()
}

/// Columns `Save` never overwrites on update.
pub fn is_update_excluded_column(column: &str) -> bool {
    matches!(column, ID_COLUMN | CREATED_AT_COLUMN | USER_ID_COLUMN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_conventions_from_table_name() {
        assert_eq!(TableConvention::resolve("users"), TableConvention::Mutable);
        assert_eq!(
            TableConvention::resolve("user_items"),
            TableConvention::UserScoped
        );
        assert_eq!(TableConvention::resolve("items"), TableConvention::ReadOnly);
        assert_eq!(
            TableConvention::resolve("users_archive"),
            TableConvention::ReadOnly
        );
    }

    #[test]
    fn only_non_user_tables_are_read_only() {
        assert!(is_read_only_table("units"));
        assert!(!is_read_only_table("users"));
        assert!(!is_read_only_table("user_bytes"));
    }

    #[test]
    fn save_skips_identity_and_ownership_columns() {
        assert!(is_update_excluded_column("id"));
        assert!(is_update_excluded_column("created_at"));
        assert!(is_update_excluded_column("user_id"));
        assert!(!is_update_excluded_column("updated_at"));
        assert!(!is_update_excluded_column("name"));
    }
}
