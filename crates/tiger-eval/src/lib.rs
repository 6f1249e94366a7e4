//! tiger-eval - The AST-evaluation engine.
//!
//! Walks a resolved Tiger AST and produces a final value plus whatever the
//! program printed. The pieces:
//!
//! - [`value::Value`]: runtime values; aggregates are `Rc`-shared with
//!   mutable cells, so aliases observe mutation
//! - [`env::Environment`] / [`env::Frame`]: the linked spine of
//!   reference-counted frames holding value and type slots
//! - [`interp::Interpreter`]: the tree walk, control flow, and the
//!   activation table that connects resolved bindings to live frames
//! - [`natives`]: the fixed-arity native-function ABI and the standard
//!   `print`/`timeGo`/`timeStop` bindings
//!
//! The driver wires a run together like this:
//!
//! ```
//! use tiger_eval::natives::{root_decls, standard_bindings, NativeCtx};
//! use tiger_eval::Interpreter;
//! use tiger_par::Parser;
//!
//! let program = Parser::new("2 + 2 * 3", None).parse().unwrap();
//! let bindings = standard_bindings();
//! let resolved = tiger_sem::resolve(&program, &root_decls(&bindings)).unwrap();
//!
//! let mut interp = Interpreter::new(resolved.scopes, NativeCtx::new(false));
//! let value = interp.run(&program, &bindings).unwrap();
//! assert_eq!(value, tiger_eval::Value::Int(8));
//! ```

pub mod env;
pub mod interp;
pub mod natives;
pub mod types;
pub mod value;

pub use env::{Environment, Frame};
pub use interp::{EvalError, EvalResult, Interpreter, Interrupt};
pub use natives::{NativeCtx, NativeError, NativeImpl, RootEntry, RootInit};
pub use types::{RecordType, TypeValue};
pub use value::{ArrayValue, Closure, NativeFunction, RecordValue, Value};
