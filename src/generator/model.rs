//! Model synthesis: instance wrappers around entities plus an in-memory
//! collection type with filter, sort and pluck helpers.

use serde::Serialize;

use crate::error::SchemaError;
use crate::generator::finder::{synthesize_find_methods, FindMethod};
use crate::generator::ir::{
    BinOp, Expr, FieldDecl, FuncDecl, Item, Param, Signature, SourceFile, Stmt, StructDecl,
    TypeRef,
};
use crate::generator::{
    value_type, Target, DAO_PACKAGE, ENTITY_PACKAGE, MODEL_PACKAGE, SORT_PATH, TIME_PATH,
};
use crate::naming;
use crate::parser::type_inference::EntityType;
use crate::schema::{Column, Table};

/// How a column's values are ordered by `SortBy<Field>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Numbers and strings, compared with `<` / `>`.
    Natural,
    /// Timestamps, compared with `Before` / `After`.
    Chronological,
    /// Flags; `false` sorts first ascending.
    Boolean,
}

/// Per-column collection helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelColumn {
    /// Backing column.
    pub column: String,
    /// Entity field name (`OtherUserID`).
    pub field: String,
    /// Plural field name used by the pluck helper (`OtherUserIDs`).
    pub plural_field: String,
    /// Value type.
    pub entity_type: EntityType,
    /// A `FilterBy<Field>` helper is generated.
    pub filterable: bool,
    /// A `SortBy<Field>` helper is generated with this ordering.
    pub sort: Option<SortOrder>,
}

impl ModelColumn {
    fn from_column(column: &Column) -> Self {
        let sort = match column.entity_type {
            EntityType::TimePtr => Some(SortOrder::Chronological),
            EntityType::Bool => Some(SortOrder::Boolean),
            ty if ty.is_comparable() => Some(SortOrder::Natural),
            _ => None,
        };
        Self {
            column: column.name.clone(),
            field: naming::field_name(&column.name),
            plural_field: naming::plural_field_name(&column.name),
            entity_type: column.entity_type,
            filterable: column.entity_type.is_comparable(),
            sort,
        }
    }

    /// Name of the filter helper.
    pub fn filter_name(&self) -> String {
        format!("FilterBy{}", self.field)
    }

    /// Name of the sort helper.
    pub fn sort_name(&self) -> String {
        format!("SortBy{}", self.field)
    }
}

/// Model layer generated for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSpec {
    /// Entity name (`Item`).
    pub name: String,
    /// Entity collection name (`Items`).
    pub collection_name: String,
    /// Field holding the data-access object (`itemDao`).
    pub dao_field: String,
    /// Instances of read-only models hold no data-access object.
    pub is_read_only: bool,
    /// Identifier column.
    pub primary_key: ModelColumn,
    /// Per-column helpers in declaration order.
    pub columns: Vec<ModelColumn>,
    /// Lookups forwarded to the data-access object.
    pub finders: Vec<FindMethod>,
}

/// Describe the model generated for `table`.
pub fn synthesize_model(table: &Table) -> Result<ModelSpec, SchemaError> {
    let primary = table
        .primary_key_column()
        .ok_or_else(|| SchemaError::MissingPrimaryKey {
            table: table.name.clone(),
        })?;
    Ok(ModelSpec {
        name: naming::entity_name(&table.name),
        collection_name: naming::collection_name(&table.name),
        dao_field: naming::dao_field_name(&table.name),
        is_read_only: table.convention().is_read_only(),
        primary_key: ModelColumn::from_column(primary),
        columns: table.columns.iter().map(ModelColumn::from_column).collect(),
        finders: synthesize_find_methods(table),
    })
}

impl ModelSpec {
    /// Single-instance wrapper type name.
    pub fn instance_name(&self) -> String {
        format!("{}Instance", self.name)
    }

    /// Collection wrapper type name.
    pub fn collection_instance_name(&self) -> String {
        format!("{}Instance", self.collection_name)
    }

    /// Model implementation type name.
    pub fn impl_name(&self) -> String {
        format!("{}Impl", self.name)
    }

    /// Methods of the collection wrapper, in emission order.
    pub fn collection_method_names(&self) -> Vec<String> {
        let mut names = vec!["Add".to_string(), format!("FindBy{}", self.primary_key.field)];
        names.extend(
            ["FilterBy", "Each", "EachWithError", "First", "At", "Len", "IsEmpty"]
                .map(String::from),
        );
        for column in &self.columns {
            if column.filterable {
                names.push(column.filter_name());
            }
            if column.sort.is_some() {
                names.push(column.sort_name());
            }
            names.push(column.plural_field.clone());
        }
        if !self.is_read_only {
            names.push("Save".to_string());
        }
        names
    }

    /// Lower to a source file in the model package.
    pub fn to_source(&self, target: &Target) -> SourceFile {
        let lowering = Lowering::new(self, target);
        let mut file = SourceFile::new(MODEL_PACKAGE);
        file.import(&lowering.entity_path);
        file.import(&lowering.dao_path);
        if self.columns.iter().any(|c| c.sort.is_some()) {
            file.import(SORT_PATH);
        }
        if self
            .columns
            .iter()
            .any(|c| c.entity_type == EntityType::TimePtr)
        {
            file.import(TIME_PATH);
        }
        file.import(&target.errors_path);

        lowering.push_model(&mut file);
        lowering.push_instance(&mut file);
        lowering.push_collection(&mut file);
        file
    }
}

struct Lowering<'a> {
    spec: &'a ModelSpec,
    target: &'a Target,
    entity_path: String,
    dao_path: String,
}

fn ident(name: &str) -> Expr {
    Expr::ident(name)
}

fn err_check() -> Expr {
    ident("err").binary(BinOp::Ne, Expr::Nil)
}

impl<'a> Lowering<'a> {
    fn new(spec: &'a ModelSpec, target: &'a Target) -> Self {
        Self {
            spec,
            target,
            entity_path: target.package_path(ENTITY_PACKAGE),
            dao_path: target.package_path(DAO_PACKAGE),
        }
    }

    fn entity(&self) -> TypeRef {
        TypeRef::qualified(&self.entity_path, &self.spec.name)
    }

    fn dao(&self) -> TypeRef {
        TypeRef::qualified(&self.dao_path, &self.spec.name)
    }

    fn instance_type(&self) -> TypeRef {
        TypeRef::named(self.spec.instance_name()).pointer()
    }

    fn collection_type(&self) -> TypeRef {
        TypeRef::named(self.spec.collection_instance_name()).pointer()
    }

    fn new_collection(&self) -> Expr {
        ident(&format!("New{}", self.spec.collection_instance_name())).call(vec![])
    }

    fn model_receiver(&self) -> Param {
        Param::new("m", TypeRef::named(self.spec.impl_name()).pointer())
    }

    fn instance_receiver(&self) -> Param {
        Param::new("i", self.instance_type())
    }

    fn collection_receiver(&self) -> Param {
        Param::new("i", self.collection_type())
    }

    fn values(&self) -> Expr {
        ident("i").field("values")
    }

    fn each_value(&self, body: Vec<Stmt>) -> Stmt {
        Stmt::ForRange {
            key: None,
            value: "v".to_string(),
            over: self.values(),
            body,
        }
    }

    fn push_model(&self, file: &mut SourceFile) {
        let spec = self.spec;
        file.push(Item::Struct(StructDecl {
            name: spec.impl_name(),
            fields: vec![FieldDecl::named(&spec.dao_field, self.dao())],
        }));

        file.push(Item::Func(FuncDecl::free(
            Signature::new(
                format!("New{}", spec.name),
                vec![Param::new(&spec.dao_field, self.dao())],
                vec![TypeRef::named(spec.impl_name()).pointer()],
            ),
            vec![Stmt::ret(vec![Expr::Composite {
                ty: TypeRef::named(spec.impl_name()),
                fields: vec![(spec.dao_field.clone(), ident(&spec.dao_field))],
            }
            .addr()])],
        )));

        let mut values = vec![(spec.name.clone(), ident("e"))];
        if !spec.is_read_only {
            values.push((
                spec.dao_field.clone(),
                ident("m").field(&spec.dao_field),
            ));
        }
        file.push(Item::Func(FuncDecl::method(
            self.model_receiver(),
            Signature::new(
                "createInstance",
                vec![Param::new("e", self.entity().pointer())],
                vec![self.instance_type()],
            ),
            vec![Stmt::ret(vec![Expr::Composite {
                ty: TypeRef::named(spec.instance_name()),
                fields: values,
            }
            .addr()])],
        )));

        file.push(Item::Func(FuncDecl::method(
            self.model_receiver(),
            Signature::new(
                "createInstances",
                vec![Param::new(
                    "es",
                    TypeRef::qualified(&self.entity_path, &spec.collection_name),
                )],
                vec![self.collection_type()],
            ),
            vec![
                Stmt::define(&["s"], self.new_collection()),
                Stmt::ForRange {
                    key: None,
                    value: "e".to_string(),
                    over: ident("es"),
                    body: vec![Stmt::Expr(ident("s").method(
                        "Add",
                        vec![ident("m").method("createInstance", vec![ident("e")])],
                    ))],
                },
                Stmt::ret(vec![ident("s")]),
            ],
        )));

        if spec.is_read_only {
            file.push(Item::Func(self.forward("FindsAll", vec![], vec![], true)));
        }
        for finder in &spec.finders {
            let params = finder
                .args
                .iter()
                .map(|arg| {
                    let ty = value_type(arg.entity_type);
                    Param::new(&arg.name, if arg.is_sequence { ty.slice() } else { ty })
                })
                .collect();
            let args = finder.args.iter().map(|arg| ident(&arg.name)).collect();
            file.push(Item::Func(self.forward(
                &finder.name,
                params,
                args,
                finder.returns_collection(),
            )));
        }
    }

    /// A model method that calls the same-named lookup on the data-access
    /// object and wraps the result.
    fn forward(&self, name: &str, params: Vec<Param>, args: Vec<Expr>, many: bool) -> FuncDecl {
        let dao_call = ident("m").field(&self.spec.dao_field).method(name, args);
        let (result, body) = if many {
            (
                self.collection_type(),
                vec![
                    Stmt::define(&["es", "err"], dao_call),
                    Stmt::when(
                        err_check(),
                        vec![Stmt::ret(vec![Expr::Nil, self.target.trace_err()])],
                    ),
                    Stmt::ret(vec![
                        ident("m").method("createInstances", vec![ident("es")]),
                        Expr::Nil,
                    ]),
                ],
            )
        } else {
            (
                self.instance_type(),
                vec![
                    Stmt::define(&["e", "err"], dao_call),
                    Stmt::when(
                        err_check(),
                        vec![Stmt::ret(vec![Expr::Nil, self.target.trace_err()])],
                    ),
                    Stmt::when(
                        ident("e").binary(BinOp::Eq, Expr::Nil),
                        vec![Stmt::ret(vec![Expr::Nil, Expr::Nil])],
                    ),
                    Stmt::ret(vec![
                        ident("m").method("createInstance", vec![ident("e")]),
                        Expr::Nil,
                    ]),
                ],
            )
        };
        FuncDecl::method(
            self.model_receiver(),
            Signature::new(name, params, vec![result, TypeRef::error()]),
            body,
        )
    }

    fn push_instance(&self, file: &mut SourceFile) {
        let spec = self.spec;
        let mut fields = vec![FieldDecl::embedded(self.entity().pointer())];
        if !spec.is_read_only {
            fields.push(FieldDecl::named(&spec.dao_field, self.dao()));
        }
        file.push(Item::Struct(StructDecl {
            name: spec.instance_name(),
            fields,
        }));

        if spec.is_read_only {
            return;
        }
        for name in ["Save", "Delete"] {
            let dao = ident("i").field(&spec.dao_field);
            file.push(Item::Func(FuncDecl::method(
                self.instance_receiver(),
                Signature::new(name, vec![], vec![TypeRef::error()]),
                vec![
                    Stmt::when(
                        dao.clone().binary(BinOp::Eq, Expr::Nil),
                        vec![Stmt::ret(vec![Expr::Nil])],
                    ),
                    Stmt::ret(vec![self
                        .target
                        .trace(dao.method(name, vec![ident("i").field(&spec.name)]))]),
                ],
            )));
        }
    }

    fn collection_method(
        &self,
        name: &str,
        params: Vec<Param>,
        results: Vec<TypeRef>,
        body: Vec<Stmt>,
    ) -> Item {
        Item::Func(FuncDecl::method(
            self.collection_receiver(),
            Signature::new(name, params, results),
            body,
        ))
    }

    fn push_collection(&self, file: &mut SourceFile) {
        let spec = self.spec;
        let instance = self.instance_type();
        let collection = self.collection_type();
        let len = || ident("len").call(vec![self.values()]);

        file.push(Item::Struct(StructDecl {
            name: spec.collection_instance_name(),
            fields: vec![FieldDecl::named("values", instance.clone().slice())],
        }));

        file.push(Item::Func(FuncDecl::free(
            Signature::new(
                format!("New{}", spec.collection_instance_name()),
                vec![],
                vec![collection.clone()],
            ),
            vec![Stmt::ret(vec![Expr::Composite {
                ty: TypeRef::named(spec.collection_instance_name()),
                fields: vec![(
                    "values".to_string(),
                    Expr::SliceLit {
                        elem: instance.clone(),
                        elems: vec![],
                    },
                )],
            }
            .addr()])],
        )));

        file.push(self.collection_method(
            "Add",
            vec![Param::new("v", instance.clone())],
            vec![],
            vec![Stmt::Assign(
                self.values(),
                ident("append").call(vec![self.values(), ident("v")]),
            )],
        ));

        let pk = &spec.primary_key;
        file.push(self.collection_method(
            &format!("FindBy{}", pk.field),
            vec![Param::new("id", value_type(pk.entity_type))],
            vec![instance.clone()],
            vec![
                self.each_value(vec![Stmt::when(
                    ident("v").field(&pk.field).binary(BinOp::Eq, ident("id")),
                    vec![Stmt::ret(vec![ident("v")])],
                )]),
                Stmt::ret(vec![Expr::Nil]),
            ],
        ));

        file.push(self.collection_method(
            "FilterBy",
            vec![Param::new(
                "f",
                TypeRef::func(vec![instance.clone()], vec![TypeRef::named("bool")]),
            )],
            vec![collection.clone()],
            vec![
                Stmt::define(&["s"], self.new_collection()),
                self.each_value(vec![Stmt::when(
                    ident("f").call(vec![ident("v")]),
                    vec![Stmt::Expr(ident("s").method("Add", vec![ident("v")]))],
                )]),
                Stmt::ret(vec![ident("s")]),
            ],
        ));

        file.push(self.collection_method(
            "Each",
            vec![Param::new("f", TypeRef::func(vec![instance.clone()], vec![]))],
            vec![],
            vec![self.each_value(vec![Stmt::Expr(ident("f").call(vec![ident("v")]))])],
        ));

        file.push(self.collection_method(
            "EachWithError",
            vec![Param::new(
                "f",
                TypeRef::func(vec![instance.clone()], vec![TypeRef::error()]),
            )],
            vec![TypeRef::error()],
            vec![
                self.each_value(vec![Stmt::when_init(
                    Stmt::define(&["err"], ident("f").call(vec![ident("v")])),
                    err_check(),
                    vec![Stmt::ret(vec![self.target.trace_err()])],
                )]),
                Stmt::ret(vec![Expr::Nil]),
            ],
        ));

        file.push(self.collection_method(
            "First",
            vec![],
            vec![instance.clone()],
            vec![
                Stmt::when(
                    len().binary(BinOp::Eq, Expr::Int(0)),
                    vec![Stmt::ret(vec![Expr::Nil])],
                ),
                Stmt::ret(vec![self.values().index(Expr::Int(0))]),
            ],
        ));

        file.push(self.collection_method(
            "At",
            vec![Param::new("idx", TypeRef::named("int"))],
            vec![instance.clone()],
            vec![
                Stmt::when(
                    ident("idx")
                        .binary(BinOp::Lt, Expr::Int(0))
                        .binary(BinOp::Or, ident("idx").binary(BinOp::Ge, len())),
                    vec![Stmt::ret(vec![Expr::Nil])],
                ),
                Stmt::ret(vec![self.values().index(ident("idx"))]),
            ],
        ));

        file.push(self.collection_method(
            "Len",
            vec![],
            vec![TypeRef::named("int")],
            vec![Stmt::ret(vec![len()])],
        ));

        file.push(self.collection_method(
            "IsEmpty",
            vec![],
            vec![TypeRef::named("bool")],
            vec![Stmt::ret(vec![ident("i")
                .method("Len", vec![])
                .binary(BinOp::Eq, Expr::Int(0))])],
        ));

        for column in &spec.columns {
            if column.filterable {
                file.push(self.filter_by(column));
            }
            if let Some(order) = column.sort {
                file.push(self.sort_by(column, order));
            }
            file.push(self.pluck(column));
        }

        if !spec.is_read_only {
            file.push(self.collection_method(
                "Save",
                vec![],
                vec![TypeRef::error()],
                vec![Stmt::ret(vec![ident("i").method(
                    "EachWithError",
                    vec![Expr::FuncLit {
                        params: vec![Param::new("v", instance)],
                        results: vec![TypeRef::error()],
                        body: vec![Stmt::ret(vec![self
                            .target
                            .trace(ident("v").method("Save", vec![]))])],
                    }],
                )])],
            ));
        }
    }

    fn filter_by(&self, column: &ModelColumn) -> Item {
        let value = ident("v").field(&column.field);
        // Timestamps are pointers; compare the instants they point at.
        let matches = if column.entity_type == EntityType::TimePtr {
            value
                .clone()
                .binary(BinOp::Ne, Expr::Nil)
                .binary(BinOp::And, ident("c").binary(BinOp::Ne, Expr::Nil))
                .binary(
                    BinOp::And,
                    value.method("Equal", vec![ident("c").deref()]),
                )
        } else {
            value.binary(BinOp::Eq, ident("c"))
        };
        self.collection_method(
            &column.filter_name(),
            vec![Param::new("c", value_type(column.entity_type))],
            vec![self.collection_type()],
            vec![
                Stmt::define(&["s"], self.new_collection()),
                self.each_value(vec![Stmt::when(
                    matches,
                    vec![Stmt::Expr(ident("s").method("Add", vec![ident("v")]))],
                )]),
                Stmt::ret(vec![ident("s")]),
            ],
        )
    }

    fn sort_by(&self, column: &ModelColumn, order: SortOrder) -> Item {
        let at = |index: &str| {
            ident("s")
                .field("values")
                .index(ident(index))
                .field(&column.field)
        };
        let (desc, asc) = match order {
            SortOrder::Natural => (
                at("i").binary(BinOp::Gt, at("j")),
                at("i").binary(BinOp::Lt, at("j")),
            ),
            SortOrder::Chronological => (
                at("i").method("After", vec![at("j").deref()]),
                at("i").method("Before", vec![at("j").deref()]),
            ),
            SortOrder::Boolean => (
                at("i").binary(BinOp::And, at("j").not()),
                at("i").not().binary(BinOp::And, at("j")),
            ),
        };
        let less = Expr::FuncLit {
            params: vec![
                Param::new("i", TypeRef::named("int")),
                Param::new("j", TypeRef::named("int")),
            ],
            results: vec![TypeRef::named("bool")],
            body: vec![
                Stmt::when(ident("isDesc"), vec![Stmt::ret(vec![desc])]),
                Stmt::ret(vec![asc]),
            ],
        };
        self.collection_method(
            &column.sort_name(),
            vec![Param::new("isDesc", TypeRef::named("bool"))],
            vec![self.collection_type()],
            vec![
                Stmt::define(&["s"], self.new_collection()),
                self.each_value(vec![Stmt::Expr(ident("s").method("Add", vec![ident("v")]))]),
                Stmt::Expr(
                    Expr::qualified(SORT_PATH, "SliceStable")
                        .call(vec![ident("s").field("values"), less]),
                ),
                Stmt::ret(vec![ident("s")]),
            ],
        )
    }

    fn pluck(&self, column: &ModelColumn) -> Item {
        let ty = value_type(column.entity_type);
        self.collection_method(
            &column.plural_field,
            vec![],
            vec![ty.clone().slice()],
            vec![
                Stmt::define(
                    &["s"],
                    Expr::SliceLit {
                        elem: ty,
                        elems: vec![],
                    },
                ),
                Stmt::Expr(ident("i").method(
                    "Each",
                    vec![Expr::FuncLit {
                        params: vec![Param::new("v", self.instance_type())],
                        results: vec![],
                        body: vec![Stmt::Assign(
                            ident("s"),
                            ident("append")
                                .call(vec![ident("s"), ident("v").field(&column.field)]),
                        )],
                    }],
                )),
                Stmt::ret(vec![ident("s")]),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::table_builder::parse_table;

    fn user_bytes() -> Table {
        parse_table(
            "CREATE TABLE user_bytes (
               id BIGINT(20) UNSIGNED NOT NULL AUTO_INCREMENT,
               user_id BIGINT(20) UNSIGNED NOT NULL,
               payload BLOB,
               is_active TINYINT(1) NOT NULL DEFAULT '1',
               created_at DATETIME,
               PRIMARY KEY (id),
               UNIQUE KEY `uniq_user` (user_id)
             );",
        )
        .unwrap()
    }

    #[test]
    fn columns_pick_sort_order_by_type() {
        let spec = synthesize_model(&user_bytes()).unwrap();
        let by_column = |name: &str| spec.columns.iter().find(|c| c.column == name).unwrap();

        assert_eq!(by_column("id").sort, Some(SortOrder::Natural));
        assert_eq!(by_column("is_active").sort, Some(SortOrder::Boolean));
        assert_eq!(by_column("created_at").sort, Some(SortOrder::Chronological));
        let payload = by_column("payload");
        assert_eq!(payload.sort, None);
        assert!(!payload.filterable);
        assert_eq!(by_column("user_id").plural_field, "UserIDs");
    }

    #[test]
    fn collection_methods_cover_every_column() {
        let spec = synthesize_model(&user_bytes()).unwrap();
        assert_eq!(spec.dao_field, "userByteDao");
        let names = spec.collection_method_names();
        for expected in [
            "FindByID",
            "FilterByUserID",
            "SortByCreatedAt",
            "UserIDs",
            "Payloads",
            "Save",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert!(!names.iter().any(|n| n == "FilterByPayload"));
    }

    #[test]
    fn source_forwards_finders_and_collection_helpers() {
        let spec = synthesize_model(&user_bytes()).unwrap();
        let file = spec.to_source(&Target::new("example"));
        let functions = file.function_names();

        assert_eq!(
            &functions[..5],
            [
                "NewUserByte",
                "createInstance",
                "createInstances",
                "Find",
                "FindByID"
            ]
        );
        assert!(functions.contains(&"Delete"));
        assert!(functions.contains(&"NewUserBytesInstance"));
        assert!(file.imports.iter().any(|p| p == "sort"));
        assert!(file.imports.iter().any(|p| p == "example/dao"));
    }

    #[test]
    fn read_only_models_expose_finds_all_without_save() {
        let table = parse_table(
            "CREATE TABLE units (id INT UNSIGNED NOT NULL, name VARCHAR(20), PRIMARY KEY (id));",
        )
        .unwrap();
        let spec = synthesize_model(&table).unwrap();
        let file = spec.to_source(&Target::new("example"));
        let functions = file.function_names();

        assert!(functions.contains(&"FindsAll"));
        assert!(!functions.contains(&"Save"));
        assert!(!spec.collection_method_names().iter().any(|n| n == "Save"));
    }
}
