/// Data-access object synthesis: lookup, save and delete surface per table.
pub mod dao;
/// Entity synthesis: record type, collection type and runtime codecs.
pub mod entity;
/// Derivation of finder methods from indexes.
pub mod finder;
/// Typed code IR handed to renderers.
pub mod ir;
/// Model synthesis: instance wrappers and collection helpers.
pub mod model;

use serde::Serialize;

use crate::generator::ir::{Expr, TypeRef};
use crate::parser::type_inference::EntityType;

/// Package holding entity types.
pub const ENTITY_PACKAGE: &str = "entity";
/// Package holding data-access objects.
pub const DAO_PACKAGE: &str = "dao";
/// Package holding models.
pub const MODEL_PACKAGE: &str = "model";

/// Default import path of the caching runtime.
pub const DEFAULT_RAPIDASH_PATH: &str = "go.knocknote.io/rapidash";
/// Default import path of the error-tracing library.
pub const DEFAULT_ERRORS_PATH: &str = "github.com/juju/errors";

pub(crate) const TIME_PATH: &str = "time";
pub(crate) const SORT_PATH: &str = "sort";

/// Where generated code lives and which runtime it targets.
///
/// Passed explicitly to every lowering step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Module path of the generated project, e.g. `example`.
    pub module: String,
    /// Import path of the caching runtime.
    pub rapidash_path: String,
    /// Import path of the error-tracing library.
    pub errors_path: String,
}

impl Target {
    /// Target the default runtime libraries from module `module`.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            rapidash_path: DEFAULT_RAPIDASH_PATH.to_string(),
            errors_path: DEFAULT_ERRORS_PATH.to_string(),
        }
    }

    /// Import path of a package inside the generated module.
    pub fn package_path(&self, package: &str) -> String {
        if self.module.is_empty() {
            package.to_string()
        } else {
            format!("{}/{package}", self.module.trim_end_matches('/'))
        }
    }

    /// A type exported by the caching runtime.
    pub(crate) fn rapidash_type(&self, name: &str) -> TypeRef {
        TypeRef::qualified(&self.rapidash_path, name)
    }

    /// `errors.Trace(err)`
    pub(crate) fn trace(&self, err: Expr) -> Expr {
        Expr::qualified(&self.errors_path, "Trace").call(vec![err])
    }

    /// `errors.Trace(err)` over the conventional `err` variable.
    pub(crate) fn trace_err(&self) -> Expr {
        self.trace(Expr::ident("err"))
    }
}

/// Value type of a field holding `entity_type`.
pub(crate) fn value_type(entity_type: EntityType) -> TypeRef {
    match entity_type {
        EntityType::TimePtr => TypeRef::qualified(TIME_PATH, "Time").pointer(),
        EntityType::ByteSlice => TypeRef::named("byte").slice(),
        EntityType::StringSlice => TypeRef::named("string").slice(),
        other => TypeRef::named(other.to_string()),
    }
}

/// Zero value of `entity_type`, used to detect unsaved or missing rows.
pub(crate) fn zero_value(entity_type: EntityType) -> Expr {
    match entity_type {
        EntityType::String => Expr::str(""),
        EntityType::Bool => Expr::ident("false"),
        ty if ty.is_integer() => Expr::Int(0),
        EntityType::Float32 | EntityType::Float64 => Expr::Int(0),
        _ => Expr::Nil,
    }
}
