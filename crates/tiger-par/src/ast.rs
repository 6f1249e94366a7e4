//! AST node definitions.
//!
//! The tree is a set of tagged unions: [`Expr`] for expressions, [`Decl`]
//! for declarations, [`Ty`] for declared types. Nodes are immutable after
//! parsing except for the resolution annotations, which the resolver writes
//! exactly once into `Cell`s:
//!
//! - every use site (an [`LValueExpr`] head, a [`CallExpr`], a [`TypeRef`])
//!   receives a [`Binding`]: the frame coordinate of its declaration;
//! - every declaration receives the [`Binding`] of its own slot;
//! - every scope node (a [`LetExpr`] or [`FuncDecl`]) receives its
//!   [`ScopeId`].
//!
//! These annotations are the entire contract between the resolver and the
//! evaluator.
//!
//! Function and native declarations are `Rc`-shared: closure values and the
//! root environment keep them alive beyond the syntax tree walk.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tiger_util::Symbol;

/// Identifier of a lexical scope (a `let`, a function, or the root scope
/// holding the native bindings). Assigned sequentially by the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The synthetic outer scope holding pre-existing (native) declarations.
    pub const ROOT: ScopeId = ScopeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The frame coordinate of a resolved name: which scope's frame, and which
/// slot within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub scope: ScopeId,
    pub index: u32,
}

impl Binding {
    pub fn new(scope: ScopeId, index: u32) -> Self {
        Self { scope, index }
    }
}

/// A named reference to a type, e.g. the `int` in `var x : int := 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeRef {
    pub name: Symbol,
    /// Written by the resolver; points at the type declaration's slot.
    pub binding: Cell<Option<Binding>>,
}

impl TypeRef {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            binding: Cell::new(None),
        }
    }
}

/// The twelve binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Add,
    Sub,
    Ge,
    Le,
    Eq,
    Ne,
    Gt,
    Lt,
    And,
    Or,
}

impl BinOp {
    /// The source spelling of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Ge => ">=",
            BinOp::Le => "<=",
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Gt => ">",
            BinOp::Lt => "<",
            BinOp::And => "&",
            BinOp::Or => "|",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `nil`
    Nil,
    /// An integer literal (negative literals are built by the parser from a
    /// leading `-`).
    Int(i64),
    /// A string literal.
    Str(String),
    /// `T[length] of init`
    Array(ArrayExpr),
    /// `T { f1 = e1, ... }`
    Record(RecordExpr),
    /// A locator used as a value: `name`, `a.b`, `a[i].c`, ...
    LValue(LValueExpr),
    /// `f(args...)`
    Call(CallExpr),
    /// `lvalue := expr`
    Assign(AssignExpr),
    /// `(e1; e2; ...)`: possibly empty; value is the last expression's.
    Seq(Vec<Expr>),
    /// `if cond then a` / `if cond then a else b`
    If(IfExpr),
    /// `while cond do body`
    While(WhileExpr),
    /// `break`
    Break,
    /// `let decls in exprs end`
    Let(LetExpr),
    /// A binary operation.
    Binary(BinaryExpr),
}

/// `T[length] of init`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayExpr {
    pub type_id: TypeRef,
    pub length: Box<Expr>,
    pub init: Box<Expr>,
}

/// `T { f1 = e1, ... }`. Literal field order is preserved, but evaluation
/// follows the *type's* declared field order.
#[derive(Clone, Debug)]
pub struct RecordExpr {
    pub type_id: TypeRef,
    pub fields: IndexMap<Symbol, Expr>,
}

impl PartialEq for RecordExpr {
    fn eq(&self, other: &Self) -> bool {
        // Field order is part of the meaning; IndexMap's own PartialEq is
        // order-insensitive, so compare in iteration order.
        self.type_id == other.type_id && self.fields.iter().eq(other.fields.iter())
    }
}

/// One step in a locator chain.
#[derive(Clone, Debug, PartialEq)]
pub enum Access {
    /// `.field`
    Field(Symbol),
    /// `[index]`
    Index(Expr),
}

/// A locator: a head name plus an optional chain of record-field or
/// array-index steps. Appears both as a value-producing expression and as
/// the left side of an assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct LValueExpr {
    pub name: Symbol,
    /// Written by the resolver; the head name's variable or parameter slot.
    pub binding: Cell<Option<Binding>>,
    pub accesses: Vec<Access>,
}

impl LValueExpr {
    /// A plain-name locator with no access chain.
    pub fn name(name: Symbol) -> Self {
        Self {
            name,
            binding: Cell::new(None),
            accesses: Vec::new(),
        }
    }

    pub fn with_accesses(name: Symbol, accesses: Vec<Access>) -> Self {
        Self {
            name,
            binding: Cell::new(None),
            accesses,
        }
    }
}

/// `f(args...)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    pub name: Symbol,
    /// Written by the resolver; the function declaration's slot.
    pub binding: Cell<Option<Binding>>,
    pub args: Vec<Expr>,
}

/// `lvalue := expr`.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignExpr {
    pub target: LValueExpr,
    pub value: Box<Expr>,
}

/// `if cond then a else b?`.
#[derive(Clone, Debug, PartialEq)]
pub struct IfExpr {
    pub cond: Box<Expr>,
    pub then_branch: Box<Expr>,
    pub else_branch: Option<Box<Expr>>,
}

/// `while cond do body`.
#[derive(Clone, Debug, PartialEq)]
pub struct WhileExpr {
    pub cond: Box<Expr>,
    pub body: Box<Expr>,
}

/// `let decls in exprs end`. A scope: entering it creates a frame with one
/// slot per declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct LetExpr {
    pub decls: Vec<Decl>,
    pub body: Vec<Expr>,
    /// Written by the resolver.
    pub scope: Cell<Option<ScopeId>>,
}

impl LetExpr {
    pub fn new(decls: Vec<Decl>, body: Vec<Expr>) -> Self {
        Self {
            decls,
            body,
            scope: Cell::new(None),
        }
    }
}

/// A binary operation.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryExpr {
    pub op: BinOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

impl BinaryExpr {
    pub fn new(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

/// A declaration: something that introduces a name into a scope.
#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Type(TypeDecl),
    Var(VarDecl),
    Func(Rc<FuncDecl>),
    Native(Rc<NativeDecl>),
}

impl Decl {
    /// The declared name.
    pub fn name(&self) -> Symbol {
        match self {
            Decl::Type(d) => d.name,
            Decl::Var(d) => d.name,
            Decl::Func(d) => d.name,
            Decl::Native(d) => d.name,
        }
    }

    /// The declaration's own slot annotation.
    pub fn slot(&self) -> &Cell<Option<Binding>> {
        match self {
            Decl::Type(d) => &d.slot,
            Decl::Var(d) => &d.slot,
            Decl::Func(d) => &d.slot,
            Decl::Native(d) => &d.slot,
        }
    }

    /// What kind of thing this declares, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Decl::Type(_) => "a type",
            Decl::Var(_) => "a variable",
            Decl::Func(_) => "a function",
            Decl::Native(_) => "a native function",
        }
    }
}

/// `type name = ty`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub name: Symbol,
    pub ty: Ty,
    pub slot: Cell<Option<Binding>>,
}

impl TypeDecl {
    pub fn new(name: Symbol, ty: Ty) -> Self {
        Self {
            name,
            ty,
            slot: Cell::new(None),
        }
    }
}

/// `var name : ty? := init`.
#[derive(Clone, Debug, PartialEq)]
pub struct VarDecl {
    pub name: Symbol,
    pub ty: Option<TypeRef>,
    pub init: Expr,
    pub slot: Cell<Option<Binding>>,
}

impl VarDecl {
    pub fn new(name: Symbol, ty: Option<TypeRef>, init: Expr) -> Self {
        Self {
            name,
            ty,
            init,
            slot: Cell::new(None),
        }
    }
}

/// One function parameter. Parameters are the declarations of a function's
/// scope, at indices `0..n`.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Symbol,
    pub ty: TypeRef,
    pub slot: Cell<Option<Binding>>,
}

impl Param {
    pub fn new(name: Symbol, ty: TypeRef) -> Self {
        Self {
            name,
            ty,
            slot: Cell::new(None),
        }
    }
}

/// `function name(params) : ty? = body`. A scope.
#[derive(Clone, Debug, PartialEq)]
pub struct FuncDecl {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    pub body: Expr,
    pub slot: Cell<Option<Binding>>,
    /// Written by the resolver.
    pub scope: Cell<Option<ScopeId>>,
}

impl FuncDecl {
    pub fn new(
        name: Symbol,
        params: Vec<Param>,
        return_type: Option<TypeRef>,
        body: Expr,
    ) -> Self {
        Self {
            name,
            params,
            return_type,
            body,
            slot: Cell::new(None),
            scope: Cell::new(None),
        }
    }
}

/// A native function declaration: a name and parameter list visible to
/// Tiger source. The host callable itself lives with the evaluator, paired
/// with this declaration in the root environment seed.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeDecl {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    pub slot: Cell<Option<Binding>>,
}

impl NativeDecl {
    pub fn new(name: Symbol, params: Vec<Param>, return_type: Option<TypeRef>) -> Self {
        Self {
            name,
            params,
            return_type,
            slot: Cell::new(None),
        }
    }
}

/// A declared type.
#[derive(Clone, Debug)]
pub enum Ty {
    /// `type t = other`
    Name(TypeRef),
    /// `type t = array of elem`
    Array(Symbol),
    /// `type t = { f1 : t1, ... }`: field order is the runtime layout.
    Record(IndexMap<Symbol, TypeRef>),
}

impl PartialEq for Ty {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Ty::Name(a), Ty::Name(b)) => a == b,
            (Ty::Array(a), Ty::Array(b)) => a == b,
            // Field order is part of the meaning; compare in iteration order.
            (Ty::Record(a), Ty::Record(b)) => a.iter().eq(b.iter()),
            _ => false,
        }
    }
}
