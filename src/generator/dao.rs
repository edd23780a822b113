//! Data-access object synthesis.
//!
//! A [`DaoSpec`] is the language-neutral description of one table's
//! data-access surface; [`DaoSpec::to_source`] lowers it onto the caching
//! runtime's transaction and query-builder API.

use serde::Serialize;

use crate::convention::{
    is_update_excluded_column, TableConvention, CREATED_AT_COLUMN, UPDATED_AT_COLUMN,
    USER_ID_COLUMN,
};
use crate::error::SchemaError;
use crate::generator::finder::{synthesize_find_methods, FindMethod, Lookup};
use crate::generator::ir::{
    BinOp, Expr, FieldDecl, FuncDecl, Item, Param, Signature, SourceFile, Stmt, StructDecl,
    TypeRef,
};
use crate::generator::{value_type, zero_value, Target, DAO_PACKAGE, ENTITY_PACKAGE, TIME_PATH};
use crate::naming;
use crate::parser::type_inference::EntityType;
use crate::schema::{Column, Table};

/// Error message returned by `Delete` for an unsaved entity.
pub const DELETE_WITHOUT_ID_MESSAGE: &str = "cannot delete without identifier";

/// An entity field touched by generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaoField {
    /// Entity field name.
    pub name: String,
    /// Backing column.
    pub column: String,
    /// Value type.
    pub entity_type: EntityType,
}

impl DaoField {
    fn from_column(column: &Column) -> Self {
        Self {
            name: naming::field_name(&column.name),
            column: column.name.clone(),
            entity_type: column.entity_type,
        }
    }
}

/// Data-access surface of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaoSpec {
    /// Interface name, equal to the entity name.
    pub name: String,
    /// Entity collection type name.
    pub collection_name: String,
    /// Source table.
    pub table_name: String,
    /// Access convention derived from the table name.
    pub convention: TableConvention,
    /// Identifier field used by save, delete and single lookups.
    pub primary_key: DaoField,
    /// Fields written by an update, in column order.
    pub update_fields: Vec<DaoField>,
    /// `Save` stamps `created_at` on insert.
    pub sets_created_at: bool,
    /// `Save` stamps `updated_at` on every call.
    pub sets_updated_at: bool,
    /// `Save` assigns the owning user on insert.
    pub sets_user_id: bool,
    /// The object is constructed with a current-user supplier.
    pub has_user_id_getter: bool,
    /// Lookup methods in interface order.
    pub methods: Vec<FindMethod>,
}

fn is_time_column(table: &Table, name: &str) -> bool {
    table
        .column(name)
        .is_some_and(|c| c.entity_type == EntityType::TimePtr)
}

/// Describe the data-access object generated for `table`.
pub fn synthesize_dao(table: &Table) -> Result<DaoSpec, SchemaError> {
    let primary = table
        .primary_key_column()
        .ok_or_else(|| SchemaError::MissingPrimaryKey {
            table: table.name.clone(),
        })?;
    let convention = table.convention();
    let methods = synthesize_find_methods(table);

    Ok(DaoSpec {
        name: naming::entity_name(&table.name),
        collection_name: naming::collection_name(&table.name),
        table_name: table.name.clone(),
        convention,
        primary_key: DaoField::from_column(primary),
        update_fields: table
            .columns
            .iter()
            .filter(|c| !c.is_primary_key && !is_update_excluded_column(&c.name))
            .map(DaoField::from_column)
            .collect(),
        sets_created_at: is_time_column(table, CREATED_AT_COLUMN),
        sets_updated_at: is_time_column(table, UPDATED_AT_COLUMN),
        sets_user_id: convention.is_user_scoped() && table.has_column(USER_ID_COLUMN),
        has_user_id_getter: convention.is_user_scoped()
            || methods.iter().any(FindMethod::is_user_scoped),
        methods,
    })
}

impl DaoSpec {
    /// Whether `Save`/`Delete` are generated.
    pub fn is_read_only(&self) -> bool {
        self.convention.is_read_only()
    }

    /// Method names in interface order.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = if self.is_read_only() {
            vec!["FindsAll".to_string()]
        } else {
            vec!["Save".to_string(), "Delete".to_string()]
        };
        names.extend(self.methods.iter().map(|m| m.name.clone()));
        names
    }

    /// Implementation struct name.
    pub fn impl_name(&self) -> String {
        format!("{}Impl", self.name)
    }

    /// Lower to a source file in the dao package.
    pub fn to_source(&self, target: &Target) -> SourceFile {
        let lowering = Lowering::new(self, target);
        let mut file = SourceFile::new(DAO_PACKAGE);
        file.import(&lowering.entity_path);
        if !self.is_read_only() && (self.sets_created_at || self.sets_updated_at) {
            file.import(TIME_PATH);
        }
        file.import(&target.errors_path);
        file.import(&target.rapidash_path);

        file.push(lowering.interface());
        file.push(lowering.impl_struct());
        file.push(Item::Func(lowering.constructor()));
        if self.is_read_only() {
            file.push(Item::Func(lowering.finds_all()));
        } else {
            file.push(Item::Func(lowering.save()));
            file.push(Item::Func(lowering.delete()));
        }
        for method in &self.methods {
            file.push(Item::Func(lowering.find(method)));
        }
        file
    }
}

/// Shared names and fragments used while lowering one [`DaoSpec`].
struct Lowering<'a> {
    spec: &'a DaoSpec,
    target: &'a Target,
    entity_path: String,
}

impl<'a> Lowering<'a> {
    fn new(spec: &'a DaoSpec, target: &'a Target) -> Self {
        Self {
            spec,
            target,
            entity_path: target.package_path(ENTITY_PACKAGE),
        }
    }

    fn entity(&self) -> TypeRef {
        TypeRef::qualified(&self.entity_path, &self.spec.name)
    }

    fn collection(&self) -> TypeRef {
        TypeRef::qualified(&self.entity_path, &self.spec.collection_name)
    }

    fn entity_param(&self) -> Param {
        Param::new("e", self.entity().pointer())
    }

    fn query_builder(&self) -> TypeRef {
        self.target.rapidash_type("QueryBuilder").pointer()
    }

    fn tx_getter_type(&self, params: Vec<TypeRef>) -> TypeRef {
        TypeRef::func(
            params,
            vec![self.target.rapidash_type("Tx").pointer(), TypeRef::error()],
        )
    }

    fn user_id_getter_type() -> TypeRef {
        TypeRef::func(vec![], vec![TypeRef::named("uint64")])
    }

    fn receiver(&self) -> Param {
        Param::new("d", TypeRef::named(self.spec.impl_name()).pointer())
    }

    fn result_type(&self, method: &FindMethod) -> TypeRef {
        if method.returns_collection() {
            self.collection()
        } else {
            self.entity().pointer()
        }
    }

    fn find_signature(&self, method: &FindMethod) -> Signature {
        Signature::new(
            &method.name,
            method
                .args
                .iter()
                .map(|arg| {
                    let ty = value_type(arg.entity_type);
                    Param::new(&arg.name, if arg.is_sequence { ty.slice() } else { ty })
                })
                .collect(),
            vec![self.result_type(method), TypeRef::error()],
        )
    }

    fn entity_signature(&self, name: &str) -> Signature {
        Signature::new(name, vec![self.entity_param()], vec![TypeRef::error()])
    }

    fn finds_all_signature(&self) -> Signature {
        Signature::new("FindsAll", vec![], vec![self.collection(), TypeRef::error()])
    }

    fn interface(&self) -> Item {
        let mut methods = if self.spec.is_read_only() {
            vec![self.finds_all_signature()]
        } else {
            vec![self.entity_signature("Save"), self.entity_signature("Delete")]
        };
        methods.extend(self.spec.methods.iter().map(|m| self.find_signature(m)));
        Item::Interface {
            name: self.spec.name.clone(),
            methods,
        }
    }

    fn impl_struct(&self) -> Item {
        let mut fields = vec![
            FieldDecl::named("tableName", TypeRef::named("string")),
            FieldDecl::named("txGetter", self.tx_getter_type(vec![])),
            FieldDecl::named("qb", TypeRef::func(vec![], vec![self.query_builder()])),
        ];
        if self.spec.has_user_id_getter {
            fields.push(FieldDecl::named("userIDGetter", Self::user_id_getter_type()));
            fields.push(FieldDecl::named(
                "uqb",
                TypeRef::func(vec![], vec![self.query_builder()]),
            ));
        }
        Item::Struct(StructDecl {
            name: self.spec.impl_name(),
            fields,
        })
    }

    fn new_query_builder(&self) -> Expr {
        Expr::qualified(&self.target.rapidash_path, "NewQueryBuilder")
            .call(vec![Expr::str(&self.spec.table_name)])
    }

    fn constructor(&self) -> FuncDecl {
        let table = || Expr::str(&self.spec.table_name);
        let mut params = vec![Param::new(
            "txGetter",
            self.tx_getter_type(vec![TypeRef::named("string")]),
        )];
        let mut fields = vec![
            ("tableName".to_string(), table()),
            (
                "txGetter".to_string(),
                Expr::FuncLit {
                    params: vec![],
                    results: vec![self.target.rapidash_type("Tx").pointer(), TypeRef::error()],
                    body: vec![Stmt::ret(vec![
                        Expr::ident("txGetter").call(vec![table()])
                    ])],
                },
            ),
            (
                "qb".to_string(),
                Expr::FuncLit {
                    params: vec![],
                    results: vec![self.query_builder()],
                    body: vec![Stmt::ret(vec![self.new_query_builder()])],
                },
            ),
        ];
        if self.spec.has_user_id_getter {
            params.push(Param::new("userIDGetter", Self::user_id_getter_type()));
            fields.push(("userIDGetter".to_string(), Expr::ident("userIDGetter")));
            fields.push((
                "uqb".to_string(),
                Expr::FuncLit {
                    params: vec![],
                    results: vec![self.query_builder()],
                    body: vec![Stmt::ret(vec![self.new_query_builder().method(
                        "Eq",
                        vec![
                            Expr::str(USER_ID_COLUMN),
                            Expr::ident("userIDGetter").call(vec![]),
                        ],
                    )])],
                },
            ));
        }

        FuncDecl::free(
            Signature::new(
                format!("New{}", self.spec.name),
                params,
                vec![TypeRef::named(&self.spec.name)],
            ),
            vec![Stmt::ret(vec![Expr::Composite {
                ty: TypeRef::named(self.spec.impl_name()),
                fields,
            }
            .addr()])],
        )
    }

    fn get_tx(&self, failure: Vec<Expr>) -> [Stmt; 2] {
        [
            Stmt::define(&["tx", "err"], Expr::ident("d").method("txGetter", vec![])),
            self.check_err(failure),
        ]
    }

    /// `if err != nil { return <failure>..., errors.Trace(err) }`
    fn check_err(&self, mut failure: Vec<Expr>) -> Stmt {
        failure.push(self.target.trace_err());
        Stmt::when(
            Expr::ident("err").binary(BinOp::Ne, Expr::Nil),
            vec![Stmt::ret(failure)],
        )
    }

    /// `if err := call; err != nil { return <failure>..., errors.Trace(err) }`
    fn try_call(&self, call: Expr, mut failure: Vec<Expr>) -> Stmt {
        failure.push(self.target.trace_err());
        Stmt::when_init(
            Stmt::define(&["err"], call),
            Expr::ident("err").binary(BinOp::Ne, Expr::Nil),
            vec![Stmt::ret(failure)],
        )
    }

    fn id_field(&self) -> Expr {
        Expr::ident("e").field(&self.spec.primary_key.name)
    }

    fn is_unsaved(&self) -> Expr {
        self.id_field()
            .binary(BinOp::Eq, zero_value(self.spec.primary_key.entity_type))
    }

    /// `b := d.qb().Eq("<pk>", e.<PK>)`
    fn id_query(&self) -> Stmt {
        Stmt::define(
            &["b"],
            Expr::ident("d").method("qb", vec![]).method(
                "Eq",
                vec![Expr::str(&self.spec.primary_key.column), self.id_field()],
            ),
        )
    }

    fn finds_all(&self) -> FuncDecl {
        let mut body = Vec::from(self.get_tx(vec![Expr::Nil]));
        body.push(Stmt::define(
            &["e"],
            Expr::Composite {
                ty: self.collection(),
                fields: vec![],
            }
            .addr(),
        ));
        body.push(self.try_call(
            Expr::ident("tx").method(
                "FindAllByTable",
                vec![Expr::ident("d").field("tableName"), Expr::ident("e")],
            ),
            vec![Expr::Nil],
        ));
        body.push(Stmt::ret(vec![Expr::ident("e").deref(), Expr::Nil]));
        FuncDecl::method(self.receiver(), self.finds_all_signature(), body)
    }

    fn save(&self) -> FuncDecl {
        let spec = self.spec;
        let now = || Expr::ident("now").addr();
        let mut body = Vec::from(self.get_tx(vec![]));
        if spec.sets_created_at || spec.sets_updated_at {
            body.push(Stmt::define(
                &["now"],
                Expr::qualified(TIME_PATH, "Now").call(vec![]),
            ));
        }
        if spec.sets_updated_at {
            body.push(Stmt::Assign(
                Expr::ident("e").field(naming::field_name(UPDATED_AT_COLUMN)),
                now(),
            ));
        }

        let mut insert = Vec::new();
        if spec.sets_user_id {
            insert.push(Stmt::Assign(
                Expr::ident("e").field(naming::field_name(USER_ID_COLUMN)),
                Expr::ident("d").method("userIDGetter", vec![]),
            ));
        }
        if spec.sets_created_at {
            insert.push(Stmt::Assign(
                Expr::ident("e").field(naming::field_name(CREATED_AT_COLUMN)),
                now(),
            ));
        }
        insert.push(Stmt::define(
            &["id", "err"],
            Expr::ident("tx").method(
                "CreateByTable",
                vec![Expr::ident("d").field("tableName"), Expr::ident("e")],
            ),
        ));
        insert.push(self.check_err(vec![]));
        if spec.primary_key.entity_type.is_integer() {
            insert.push(Stmt::Assign(
                self.id_field(),
                Expr::ident(spec.primary_key.entity_type.to_string())
                    .call(vec![Expr::ident("id")]),
            ));
        }
        insert.push(Stmt::ret(vec![Expr::Nil]));
        body.push(Stmt::when(self.is_unsaved(), insert));

        body.push(self.id_query());
        body.push(Stmt::define(
            &["m"],
            Expr::MapLit {
                key: TypeRef::named("string"),
                value: TypeRef::Any,
                entries: spec
                    .update_fields
                    .iter()
                    .map(|f| (Expr::str(&f.column), Expr::ident("e").field(&f.name)))
                    .collect(),
            },
        ));
        body.push(self.try_call(
            Expr::ident("tx").method(
                "UpdateByQueryBuilder",
                vec![Expr::ident("b"), Expr::ident("m")],
            ),
            vec![],
        ));
        body.push(Stmt::ret(vec![Expr::Nil]));
        FuncDecl::method(self.receiver(), self.entity_signature("Save"), body)
    }

    fn delete(&self) -> FuncDecl {
        let mut body = Vec::from(self.get_tx(vec![]));
        body.push(Stmt::when(
            self.is_unsaved(),
            vec![Stmt::ret(vec![Expr::qualified(&self.target.errors_path, "New")
                .call(vec![Expr::str(DELETE_WITHOUT_ID_MESSAGE)])])],
        ));
        body.push(self.id_query());
        body.push(self.try_call(
            Expr::ident("tx").method("DeleteByQueryBuilder", vec![Expr::ident("b")]),
            vec![],
        ));
        body.push(Stmt::ret(vec![Expr::Nil]));
        FuncDecl::method(self.receiver(), self.entity_signature("Delete"), body)
    }

    /// The query a finder runs: the user-scoped builder when `user_id` is a
    /// lookup column, then one condition per caller argument.
    fn finder_query(&self, method: &FindMethod) -> Expr {
        let base = if method.is_user_scoped() { "uqb" } else { "qb" };
        let mut query = Expr::ident("d").method(base, vec![]);
        for arg in &method.args {
            let condition = match method.lookup {
                Lookup::Eq => "Eq",
                Lookup::In => "In",
            };
            query = query.method(
                condition,
                vec![Expr::str(&arg.column), Expr::ident(&arg.name)],
            );
        }
        query
    }

    fn find(&self, method: &FindMethod) -> FuncDecl {
        let result = if method.returns_collection() {
            self.collection()
        } else {
            self.entity()
        };
        let mut body = Vec::from(self.get_tx(vec![Expr::Nil]));
        body.push(Stmt::define(&["b"], self.finder_query(method)));
        body.push(Stmt::define(
            &["e"],
            Expr::Composite {
                ty: result,
                fields: vec![],
            }
            .addr(),
        ));
        body.push(self.try_call(
            Expr::ident("tx").method(
                "FindByQueryBuilder",
                vec![Expr::ident("b"), Expr::ident("e")],
            ),
            vec![Expr::Nil],
        ));
        if method.returns_collection() {
            body.push(Stmt::ret(vec![Expr::ident("e").deref(), Expr::Nil]));
        } else {
            body.push(Stmt::when(
                self.is_unsaved(),
                vec![Stmt::ret(vec![Expr::Nil, Expr::Nil])],
            ));
            body.push(Stmt::ret(vec![Expr::ident("e"), Expr::Nil]));
        }
        FuncDecl::method(self.receiver(), self.find_signature(method), body)
    }
}
