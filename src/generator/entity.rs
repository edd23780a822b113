//! Entity synthesis: one struct per table plus the structable registry.
//!
//! Read-only entities carry `csv` serialization tags; mutable ones also
//! encode themselves for the caching runtime.

use serde::Serialize;

use crate::generator::ir::{
    BinOp, Expr, FieldDecl, FuncDecl, Item, Param, Signature, SourceFile, Stmt, StructDecl,
    TypeRef,
};
use crate::generator::{value_type, zero_value, Target, ENTITY_PACKAGE, TIME_PATH};
use crate::naming;
use crate::parser::type_inference::EntityType;
use crate::schema::Table;

/// Serialization tag key used for read-only entities.
pub const SERIAL_TAG: &str = "csv";

/// Record type generated for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySpec {
    /// Entity type name (`Item`).
    pub name: String,
    /// Collection type name (`Items`).
    pub collection_name: String,
    /// Source table.
    pub table_name: String,
    /// Read-only entities get serialization tags and no encoder.
    pub is_read_only: bool,
    /// One field per column, in declaration order.
    pub fields: Vec<EntityField>,
}

/// One entity field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityField {
    /// Field name (`UserID`).
    pub name: String,
    /// Backing column.
    pub column: String,
    /// Value type.
    pub entity_type: EntityType,
    /// Serialization name, present on read-only entities.
    pub serial_name: Option<String>,
    /// The column is the primary key.
    pub is_primary_key: bool,
}

/// Describe the entity generated for `table`.
pub fn synthesize_entity(table: &Table) -> EntitySpec {
    let read_only = table.convention().is_read_only();
    EntitySpec {
        name: naming::entity_name(&table.name),
        collection_name: naming::collection_name(&table.name),
        table_name: table.name.clone(),
        is_read_only: read_only,
        fields: table
            .columns
            .iter()
            .map(|column| EntityField {
                name: naming::field_name(&column.name),
                column: column.name.clone(),
                entity_type: column.entity_type,
                serial_name: read_only.then(|| naming::serial_name(&column.name)),
                is_primary_key: column.is_primary_key,
            })
            .collect(),
    }
}

/// Runtime codec method suffix for a value type (`enc.Uint64`, `dec.TimePtr`).
fn codec_method(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::String => "String",
        EntityType::Bool => "Bool",
        EntityType::Int8 => "Int8",
        EntityType::Int16 => "Int16",
        EntityType::Int32 => "Int32",
        EntityType::Int64 => "Int64",
        EntityType::Uint8 => "Uint8",
        EntityType::Uint16 => "Uint16",
        EntityType::Uint32 => "Uint32",
        EntityType::Uint64 => "Uint64",
        EntityType::Float32 => "Float32",
        EntityType::Float64 => "Float64",
        EntityType::TimePtr => "TimePtr",
        EntityType::ByteSlice => "Bytes",
        EntityType::StringSlice => "Strings",
    }
}

/// Schema declaration method for a value type (`s.FieldUint64`).
fn struct_field_method(entity_type: EntityType) -> String {
    match entity_type {
        EntityType::TimePtr => "FieldTime".to_string(),
        other => format!("Field{}", codec_method(other)),
    }
}

impl EntitySpec {
    /// The primary-key field.
    pub fn primary_key(&self) -> Option<&EntityField> {
        self.fields.iter().find(|f| f.is_primary_key)
    }

    /// Lower to a source file in the entity package.
    pub fn to_source(&self, target: &Target) -> SourceFile {
        let mut file = SourceFile::new(ENTITY_PACKAGE);
        file.import(&target.errors_path);
        file.import(&target.rapidash_path);
        if self
            .fields
            .iter()
            .any(|f| f.entity_type == EntityType::TimePtr)
        {
            file.import(TIME_PATH);
        }

        file.push(Item::Struct(StructDecl {
            name: self.name.clone(),
            fields: self
                .fields
                .iter()
                .map(|f| FieldDecl {
                    name: Some(f.name.clone()),
                    ty: value_type(f.entity_type),
                    tags: f
                        .serial_name
                        .iter()
                        .map(|s| (SERIAL_TAG.to_string(), s.clone()))
                        .collect(),
                })
                .collect(),
        }));
        file.push(Item::TypeAlias {
            name: self.collection_name.clone(),
            ty: TypeRef::named(&self.name).pointer().slice(),
        });

        if !self.is_read_only {
            file.push(Item::Func(self.encode(target)));
            file.push(Item::Func(self.encode_collection(target)));
        }
        file.push(Item::Func(self.decode(target)));
        file.push(Item::Func(self.decode_collection(target)));
        file.push(Item::Func(self.struct_schema(target)));
        file
    }

    fn receiver(&self) -> Param {
        Param::new("e", TypeRef::named(&self.name).pointer())
    }

    fn collection_receiver(&self) -> Param {
        Param::new("e", TypeRef::named(&self.collection_name).pointer())
    }

    fn encode(&self, target: &Target) -> FuncDecl {
        let enc = || Expr::ident("enc");
        let put = |f: &EntityField| {
            Stmt::Expr(enc().method(
                codec_method(f.entity_type),
                vec![Expr::str(&f.column), Expr::ident("e").field(&f.name)],
            ))
        };

        let mut body = Vec::new();
        // The identifier is only sent once assigned, so inserts get one.
        if let Some(pk) = self.primary_key() {
            body.push(Stmt::when(
                Expr::ident("e")
                    .field(&pk.name)
                    .binary(BinOp::Ne, zero_value(pk.entity_type)),
                vec![put(pk)],
            ));
        }
        body.extend(self.fields.iter().filter(|f| !f.is_primary_key).map(put));
        body.push(Stmt::ret(vec![enc().method("Error", vec![])]));

        FuncDecl::method(
            self.receiver(),
            Signature::new(
                "EncodeRapidash",
                vec![Param::new("enc", target.rapidash_type("Encoder"))],
                vec![TypeRef::error()],
            ),
            body,
        )
    }

    fn encode_collection(&self, target: &Target) -> FuncDecl {
        FuncDecl::method(
            self.collection_receiver(),
            Signature::new(
                "EncodeRapidash",
                vec![Param::new("enc", target.rapidash_type("Encoder"))],
                vec![TypeRef::error()],
            ),
            vec![
                Stmt::ForRange {
                    key: None,
                    value: "v".to_string(),
                    over: Expr::ident("e").deref(),
                    body: vec![Stmt::when_init(
                        Stmt::define(
                            &["err"],
                            Expr::ident("v").method(
                                "EncodeRapidash",
                                vec![Expr::ident("enc").method("New", vec![])],
                            ),
                        ),
                        Expr::ident("err").binary(BinOp::Ne, Expr::Nil),
                        vec![Stmt::ret(vec![target.trace_err()])],
                    )],
                },
                Stmt::ret(vec![Expr::Nil]),
            ],
        )
    }

    fn decode(&self, target: &Target) -> FuncDecl {
        let mut body: Vec<Stmt> = self
            .fields
            .iter()
            .map(|f| {
                Stmt::Assign(
                    Expr::ident("e").field(&f.name),
                    Expr::ident("dec").method(codec_method(f.entity_type), vec![Expr::str(&f.column)]),
                )
            })
            .collect();
        body.push(Stmt::ret(vec![Expr::ident("dec").method("Error", vec![])]));

        FuncDecl::method(
            self.receiver(),
            Signature::new(
                "DecodeRapidash",
                vec![Param::new("dec", target.rapidash_type("Decoder"))],
                vec![TypeRef::error()],
            ),
            body,
        )
    }

    fn decode_collection(&self, target: &Target) -> FuncDecl {
        let element = TypeRef::named(&self.name);
        FuncDecl::method(
            self.collection_receiver(),
            Signature::new(
                "DecodeRapidash",
                vec![Param::new("dec", target.rapidash_type("Decoder"))],
                vec![TypeRef::error()],
            ),
            vec![
                Stmt::define(&["count"], Expr::ident("dec").method("Len", vec![])),
                Stmt::Assign(
                    Expr::ident("e").deref(),
                    Expr::ident("make").call(vec![
                        Expr::Type(element.clone().pointer().slice()),
                        Expr::ident("count"),
                    ]),
                ),
                Stmt::ForCount {
                    var: "i".to_string(),
                    start: Expr::Int(0),
                    end: Expr::ident("count"),
                    body: vec![
                        Stmt::Var("v".to_string(), element),
                        Stmt::when_init(
                            Stmt::define(
                                &["err"],
                                Expr::ident("v").method(
                                    "DecodeRapidash",
                                    vec![Expr::ident("dec").method("At", vec![Expr::ident("i")])],
                                ),
                            ),
                            Expr::ident("err").binary(BinOp::Ne, Expr::Nil),
                            vec![Stmt::ret(vec![target.trace_err()])],
                        ),
                        Stmt::Assign(
                            Expr::ident("e").deref().paren().index(Expr::ident("i")),
                            Expr::ident("v").addr(),
                        ),
                    ],
                },
                Stmt::ret(vec![Expr::Nil]),
            ],
        )
    }

    fn struct_schema(&self, target: &Target) -> FuncDecl {
        let mut body = vec![Stmt::define(
            &["s"],
            Expr::qualified(&target.rapidash_path, "NewStruct")
                .call(vec![Expr::str(&self.table_name)]),
        )];
        body.extend(self.fields.iter().map(|f| {
            Stmt::Expr(
                Expr::ident("s").method(struct_field_method(f.entity_type), vec![Expr::str(&f.column)]),
            )
        }));
        body.push(Stmt::ret(vec![Expr::ident("s")]));

        FuncDecl::method(
            self.receiver(),
            Signature::new(
                "Struct",
                vec![],
                vec![target.rapidash_type("Struct").pointer()],
            ),
            body,
        )
    }
}

/// The registry file mapping table names to fresh entity values.
///
/// Mutable and read-only tables are registered separately so callers can
/// warm the cache for master data only.
pub fn structables_source(entities: &[EntitySpec], target: &Target) -> SourceFile {
    let mut file = SourceFile::new(ENTITY_PACKAGE);
    file.import(&target.rapidash_path);

    file.push(Item::Interface {
        name: "Structable".to_string(),
        methods: vec![Signature::new(
            "Struct",
            vec![],
            vec![target.rapidash_type("Struct").pointer()],
        )],
    });

    for (name, read_only) in [("Structables", false), ("ReadOnlyStructables", true)] {
        let registry = TypeRef::map(TypeRef::named("string"), TypeRef::named("Structable"));
        let entries = entities
            .iter()
            .filter(|e| e.is_read_only == read_only)
            .map(|e| {
                (
                    Expr::str(&e.table_name),
                    Expr::ident("new").call(vec![Expr::ident(&e.name)]),
                )
            })
            .collect();
        file.push(Item::Func(FuncDecl::free(
            Signature::new(name, vec![], vec![registry]),
            vec![Stmt::ret(vec![Expr::MapLit {
                key: TypeRef::named("string"),
                value: TypeRef::named("Structable"),
                entries,
            }])],
        )));
    }
    file
}
