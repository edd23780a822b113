//! Typed code intermediate representation.
//!
//! Synthesizers lower their structured descriptions into a [`SourceFile`];
//! a [`Renderer`](crate::output::go::Renderer) turns it into text. The IR is
//! data-only: it knows nothing about formatting or import aliases.
//!
//! Qualified references carry the full import path of their package. The
//! synthesizer that builds a file lists the same paths in
//! [`SourceFile::imports`].

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Package (or module) the file belongs to.
    pub package: String,
    /// Import paths used by qualified references, in insertion order.
    pub imports: Vec<String>,
    /// Top-level declarations in emission order.
    pub items: Vec<Item>,
}

impl SourceFile {
    /// Create an empty file in `package`.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            imports: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Record an import path once.
    pub fn import(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.imports.contains(&path) {
            self.imports.push(path);
        }
    }

    /// Append a declaration.
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Names of all declared functions and methods, in order.
    pub fn function_names(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Func(func) => Some(func.signature.name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Record type.
    Struct(StructDecl),
    /// Named type defined from another type, e.g. a slice of pointers.
    TypeAlias {
        /// Declared name.
        name: String,
        /// Underlying type.
        ty: TypeRef,
    },
    /// Method-set type.
    Interface {
        /// Declared name.
        name: String,
        /// Method signatures in order.
        methods: Vec<Signature>,
    },
    /// Free function or method.
    Func(FuncDecl),
}

/// A record type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    /// Declared name.
    pub name: String,
    /// Fields in order.
    pub fields: Vec<FieldDecl>,
}

/// One struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name; `None` embeds the type.
    pub name: Option<String>,
    /// Field type.
    pub ty: TypeRef,
    /// Serialization tags as `(key, value)` pairs.
    pub tags: Vec<(String, String)>,
}

impl FieldDecl {
    /// A named field without tags.
    pub fn named(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: Some(name.into()),
            ty,
            tags: Vec::new(),
        }
    }

    /// An embedded field.
    pub fn embedded(ty: TypeRef) -> Self {
        Self {
            name: None,
            ty,
            tags: Vec::new(),
        }
    }
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    /// Method receiver; `None` for free functions.
    pub receiver: Option<Param>,
    /// Name, parameters and results.
    pub signature: Signature,
    /// Body statements.
    pub body: Vec<Stmt>,
}

impl FuncDecl {
    /// A method on `receiver`.
    pub fn method(receiver: Param, signature: Signature, body: Vec<Stmt>) -> Self {
        Self {
            receiver: Some(receiver),
            signature,
            body,
        }
    }

    /// A free function.
    pub fn free(signature: Signature, body: Vec<Stmt>) -> Self {
        Self {
            receiver: None,
            signature,
            body,
        }
    }
}

/// Name, parameter list and result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Function or method name.
    pub name: String,
    /// Parameters in order.
    pub params: Vec<Param>,
    /// Result types in order.
    pub results: Vec<TypeRef>,
}

impl Signature {
    /// Build a signature.
    pub fn new(name: impl Into<String>, params: Vec<Param>, results: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            params,
            results,
        }
    }
}

/// A named, typed parameter (also used for receivers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: TypeRef,
}

impl Param {
    /// Build a parameter.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Built-in or same-package type.
    Named(String),
    /// Type from another package, by import path.
    Qualified {
        /// Import path of the package.
        package: String,
        /// Type name.
        name: String,
    },
    /// Pointer to a type.
    Pointer(Box<TypeRef>),
    /// Growable sequence.
    Slice(Box<TypeRef>),
    /// Associative map.
    Map(Box<TypeRef>, Box<TypeRef>),
    /// Function type.
    Func {
        /// Parameter types.
        params: Vec<TypeRef>,
        /// Result types.
        results: Vec<TypeRef>,
    },
    /// The empty interface.
    Any,
}

impl TypeRef {
    /// A built-in or same-package type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// A type from the package at `package`.
    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Pointer to `self`.
    pub fn pointer(self) -> Self {
        Self::Pointer(Box::new(self))
    }

    /// Slice of `self`.
    pub fn slice(self) -> Self {
        Self::Slice(Box::new(self))
    }

    /// Map from `key` to `value`.
    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Function type.
    pub fn func(params: Vec<TypeRef>, results: Vec<TypeRef>) -> Self {
        Self::Func { params, results }
    }

    /// The built-in error type.
    pub fn error() -> Self {
        Self::named("error")
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Address-of.
    Addr,
    /// Pointer dereference.
    Deref,
    /// Logical negation.
    Not,
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Local identifier.
    Ident(String),
    /// Identifier exported by another package.
    Qualified {
        /// Import path of the package.
        package: String,
        /// Exported name.
        name: String,
    },
    /// The nil value.
    Nil,
    /// String literal (unescaped content).
    Str(String),
    /// Integer literal.
    Int(i64),
    /// A type used in expression position, e.g. a `make` argument.
    Type(TypeRef),
    /// Field or method selection.
    Field(Box<Expr>, String),
    /// Call.
    Call(Box<Expr>, Vec<Expr>),
    /// Indexing.
    Index(Box<Expr>, Box<Expr>),
    /// Unary operation.
    Unary(UnaryOp, Box<Expr>),
    /// Binary operation.
    Binary(Box<Expr>, BinOp, Box<Expr>),
    /// Parenthesized expression.
    Paren(Box<Expr>),
    /// Keyed composite literal of a struct type.
    Composite {
        /// Literal type.
        ty: TypeRef,
        /// Ordered `(field, value)` pairs.
        fields: Vec<(String, Expr)>,
    },
    /// Slice literal.
    SliceLit {
        /// Element type.
        elem: TypeRef,
        /// Elements.
        elems: Vec<Expr>,
    },
    /// Map literal with ordered entries.
    MapLit {
        /// Key type.
        key: TypeRef,
        /// Value type.
        value: TypeRef,
        /// Ordered `(key, value)` pairs.
        entries: Vec<(Expr, Expr)>,
    },
    /// Anonymous function.
    FuncLit {
        /// Parameters.
        params: Vec<Param>,
        /// Result types.
        results: Vec<TypeRef>,
        /// Body statements.
        body: Vec<Stmt>,
    },
}

impl Expr {
    /// A local identifier.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    /// A name exported by the package at `package`.
    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    /// A string literal.
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// `self.name`
    pub fn field(self, name: impl Into<String>) -> Self {
        Self::Field(Box::new(self), name.into())
    }

    /// `self(args...)`
    pub fn call(self, args: Vec<Expr>) -> Self {
        Self::Call(Box::new(self), args)
    }

    /// `self.name(args...)`
    pub fn method(self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        self.field(name).call(args)
    }

    /// `self[index]`
    pub fn index(self, index: Expr) -> Self {
        Self::Index(Box::new(self), Box::new(index))
    }

    /// `&self`
    pub fn addr(self) -> Self {
        Self::Unary(UnaryOp::Addr, Box::new(self))
    }

    /// `*self`
    pub fn deref(self) -> Self {
        Self::Unary(UnaryOp::Deref, Box::new(self))
    }

    /// `!self`
    pub fn not(self) -> Self {
        Self::Unary(UnaryOp::Not, Box::new(self))
    }

    /// `(self)`
    pub fn paren(self) -> Self {
        Self::Paren(Box::new(self))
    }

    /// `self <op> rhs`
    pub fn binary(self, op: BinOp, rhs: Expr) -> Self {
        Self::Binary(Box::new(self), op, Box::new(rhs))
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Expression evaluated for its effect.
    Expr(Expr),
    /// Short variable declaration `a, b := value`.
    Define(Vec<String>, Expr),
    /// Assignment `target = value`.
    Assign(Expr, Expr),
    /// Zero-valued variable `var name T`.
    Var(String, TypeRef),
    /// Return with values.
    Return(Vec<Expr>),
    /// Conditional with optional init statement.
    If {
        /// Statement run before the condition.
        init: Option<Box<Stmt>>,
        /// Condition.
        cond: Expr,
        /// Statements run when the condition holds.
        then: Vec<Stmt>,
    },
    /// Range loop over a sequence.
    ForRange {
        /// Index binding; `None` discards it.
        key: Option<String>,
        /// Element binding.
        value: String,
        /// Iterated sequence.
        over: Expr,
        /// Loop body.
        body: Vec<Stmt>,
    },
    /// Counting loop `for var := start; var < end; var++`.
    ForCount {
        /// Loop variable.
        var: String,
        /// Initial value.
        start: Expr,
        /// Exclusive upper bound.
        end: Expr,
        /// Loop body.
        body: Vec<Stmt>,
    },
}

impl Stmt {
    /// `names := value`
    pub fn define(names: &[&str], value: Expr) -> Self {
        Self::Define(names.iter().map(|n| (*n).to_string()).collect(), value)
    }

    /// `if cond { then }`
    pub fn when(cond: Expr, then: Vec<Stmt>) -> Self {
        Self::If {
            init: None,
            cond,
            then,
        }
    }

    /// `if init; cond { then }`
    pub fn when_init(init: Stmt, cond: Expr, then: Vec<Stmt>) -> Self {
        Self::If {
            init: Some(Box::new(init)),
            cond,
            then,
        }
    }

    /// `return values...`
    pub fn ret(values: Vec<Expr>) -> Self {
        Self::Return(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_are_recorded_once_in_order() {
        let mut file = SourceFile::new("dao");
        file.import("example/entity");
        file.import("go.knocknote.io/rapidash");
        file.import("example/entity");
        assert_eq!(file.imports, vec!["example/entity", "go.knocknote.io/rapidash"]);
    }

    #[test]
    fn builders_nest_left_to_right() {
        let expr = Expr::ident("d").method("qb", vec![]).method(
            "Eq",
            vec![Expr::str("id"), Expr::ident("k0")],
        );
        let Expr::Call(callee, args) = &expr else {
            panic!("expected a call");
        };
        assert_eq!(args.len(), 2);
        assert!(matches!(callee.as_ref(), Expr::Field(_, name) if name == "Eq"));
    }

    #[test]
    fn function_names_lists_funcs_only() {
        let mut file = SourceFile::new("entity");
        file.push(Item::TypeAlias {
            name: "Items".to_string(),
            ty: TypeRef::named("Item").pointer().slice(),
        });
        file.push(Item::Func(FuncDecl::free(
            Signature::new("Structables", vec![], vec![]),
            vec![],
        )));
        assert_eq!(file.function_names(), vec!["Structables"]);
    }
}
