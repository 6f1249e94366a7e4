//! tiger-par - AST model and parser for Tiger.
//!
//! Tokens go in, a single root expression comes out:
//!
//! ```
//! use tiger_par::Parser;
//!
//! let program = Parser::new("let var x := 1 in x + 1 end", None).parse().unwrap();
//! ```
//!
//! The produced tree carries empty resolution annotation cells; the
//! `tiger-sem` crate fills them in before the tree reaches the evaluator.

pub mod ast;
pub mod parser;

pub use ast::{
    Access, ArrayExpr, AssignExpr, BinOp, BinaryExpr, Binding, CallExpr, Decl, Expr, FuncDecl,
    IfExpr, LValueExpr, LetExpr, NativeDecl, Param, RecordExpr, ScopeId, Ty, TypeDecl, TypeRef,
    VarDecl, WhileExpr,
};
pub use parser::{ParseError, ParseResult, Parser};
