//! tiger-lex - Lexical analysis for Tiger source text.
//!
//! This crate turns a UTF-8 source string into a stream of positioned
//! tokens. The parser pulls tokens on demand through two operations:
//! [`Lexer::next`] consumes the next token, and [`Lexer::peek`] looks `k`
//! tokens ahead without consuming anything; an internal buffer makes
//! arbitrary lookahead cheap.
//!
//! ```
//! use tiger_lex::{Lexer, TokenKind};
//!
//! let mut lexer = Lexer::new("let var x := 42 in x end", None);
//! let first = lexer.next().unwrap();
//! assert!(matches!(first.kind, TokenKind::Keyword(_)));
//! ```
//!
//! Whitespace, line terminators, and (arbitrarily nested) `/* ... */`
//! comments are consumed between tokens; line terminators advance the line
//! counter used in diagnostics. All errors are fatal and carry the offending
//! location.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use lexer::{LexError, LexResult, Lexer};
pub use token::{keyword_from_ident, Keyword, Sym, Token, TokenKind};
