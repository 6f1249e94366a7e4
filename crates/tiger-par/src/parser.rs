//! Recursive-descent parser for Tiger.
//!
//! Produces a single root [`Expr`] from a token stream. Operator precedence
//! is handled by a precedence-climbing loop over primary expressions with
//! the fixed table (higher binds tighter):
//!
//! | level | operators                  |
//! |-------|----------------------------|
//! | 5     | `*` `/`                    |
//! | 4     | `+` `-`                    |
//! | 3     | `>=` `<=` `=` `<>` `>` `<` |
//! | 2     | `&`                        |
//! | 1     | `\|`                       |
//!
//! All operators are left-associative; comparisons do not chain in any
//! useful way but parse left-associatively like the rest.
//!
//! `for` loops are desugared here, at AST construction, into
//! `let var v := start in while v <= end do (body; v := v + 1) end`, so the
//! resolver and evaluator only ever see `let` and `while`.

use std::cell::Cell;
use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;
use tiger_lex::{Keyword, LexError, Lexer, Sym, Token, TokenKind};
use tiger_util::{Location, Symbol};

use crate::ast::{
    Access, ArrayExpr, AssignExpr, BinOp, BinaryExpr, CallExpr, Decl, Expr, FuncDecl, IfExpr,
    LValueExpr, LetExpr, Param, RecordExpr, Ty, TypeDecl, TypeRef, VarDecl, WhileExpr,
};

/// Errors raised while parsing. Structured parse failures carry a
/// human-readable "expected X" description plus the offending token and its
/// location.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{token} at {location}: expected {expected}")]
    Unexpected {
        expected: String,
        token: Token,
        location: Location,
    },

    #[error("{location}: integer literal '{digits}' is out of range")]
    IntegerOutOfRange { digits: Symbol, location: Location },

    #[error("{location}: import declarations are not supported")]
    ImportUnsupported { location: Location },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// The Tiger parser.
///
/// # Example
///
/// ```
/// use tiger_par::Parser;
///
/// let expr = Parser::new("2 + 2 * 3", None).parse().unwrap();
/// assert!(matches!(expr, tiger_par::Expr::Binary(_)));
/// ```
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `source`; `file` names the source in
    /// diagnostics.
    pub fn new(source: &'a str, file: Option<&str>) -> Self {
        Self {
            lexer: Lexer::new(source, file),
        }
    }

    /// Parses the whole source as a single expression.
    pub fn parse(mut self) -> ParseResult<Expr> {
        let expr = self.parse_expression()?;

        let trailing = self.lexer.next()?;
        if !trailing.is_eof() {
            return Err(self.unexpected("end of file", trailing));
        }
        Ok(expr)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_binary(1)
    }

    /// Precedence climbing: consume operators of at least `min_prec`,
    /// recursing with `prec + 1` for left associativity.
    fn parse_binary(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut left = self.parse_primary()?;

        loop {
            let Some((op, prec)) = self.peek_binop()? else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.lexer.next()?;
            let right = self.parse_binary(prec + 1)?;
            left = BinaryExpr::new(op, left, right);
        }

        Ok(left)
    }

    fn peek_binop(&mut self) -> ParseResult<Option<(BinOp, u8)>> {
        let token = self.lexer.peek(0)?;
        let TokenKind::Sym(sym) = token.kind else {
            return Ok(None);
        };
        let entry = match sym {
            Sym::Star => (BinOp::Mul, 5),
            Sym::Slash => (BinOp::Div, 5),
            Sym::Plus => (BinOp::Add, 4),
            Sym::Minus => (BinOp::Sub, 4),
            Sym::Ge => (BinOp::Ge, 3),
            Sym::Le => (BinOp::Le, 3),
            Sym::Eq => (BinOp::Eq, 3),
            Sym::Ne => (BinOp::Ne, 3),
            Sym::Gt => (BinOp::Gt, 3),
            Sym::Lt => (BinOp::Lt, 3),
            Sym::Amp => (BinOp::And, 2),
            Sym::Pipe => (BinOp::Or, 1),
            _ => return Ok(None),
        };
        Ok(Some(entry))
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.lexer.next()?;
        match &token.kind {
            TokenKind::Keyword(Keyword::Nil) => Ok(Expr::Nil),
            TokenKind::Number(digits) => {
                Ok(Expr::Int(self.convert_integer(*digits, false, &token)?))
            }
            TokenKind::Sym(Sym::Minus) => {
                let number = self.lexer.next()?;
                let digits = match &number.kind {
                    TokenKind::Number(digits) => *digits,
                    _ => return Err(self.unexpected("an integer literal after '-'", number)),
                };
                Ok(Expr::Int(self.convert_integer(digits, true, &number)?))
            }
            TokenKind::Str(text) => Ok(Expr::Str(text.clone())),
            TokenKind::Sym(Sym::LParen) => self.parse_sequence(),
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::Break) => Ok(Expr::Break),
            TokenKind::Keyword(Keyword::Let) => self.parse_let(),
            TokenKind::Ident(name) => {
                let name = *name;
                self.parse_identifier_headed(name)
            }
            _ => Err(self.unexpected("an expression", token)),
        }
    }

    /// `( e1; e2; ... )`: possibly empty.
    fn parse_sequence(&mut self) -> ParseResult<Expr> {
        let mut exprs = Vec::new();
        if !self.eat_sym(Sym::RParen)? {
            loop {
                exprs.push(self.parse_expression()?);
                if !self.eat_sym(Sym::Semicolon)? {
                    break;
                }
            }
            self.expect_sym(Sym::RParen, "')' to close the sequence")?;
        }
        Ok(Expr::Seq(exprs))
    }

    fn parse_if(&mut self) -> ParseResult<Expr> {
        let cond = self.parse_expression()?;
        self.expect_keyword(Keyword::Then, "'then'")?;
        let then_branch = self.parse_expression()?;
        let else_branch = if self.eat_keyword(Keyword::Else)? {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Expr::If(IfExpr {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch,
        }))
    }

    fn parse_while(&mut self) -> ParseResult<Expr> {
        let cond = self.parse_expression()?;
        self.expect_keyword(Keyword::Do, "'do'")?;
        let body = self.parse_expression()?;
        Ok(Expr::While(WhileExpr {
            cond: Box::new(cond),
            body: Box::new(body),
        }))
    }

    /// `for v := start to end do body`, desugared into
    /// `let var v := start in while v <= end do (body; v := v + 1) end`.
    fn parse_for(&mut self) -> ParseResult<Expr> {
        let var = self.expect_ident("the loop variable name")?;
        self.expect_sym(Sym::Assign, "':='")?;
        let start = self.parse_expression()?;
        self.expect_keyword(Keyword::To, "'to'")?;
        let end = self.parse_expression()?;
        self.expect_keyword(Keyword::Do, "'do'")?;
        let body = self.parse_expression()?;

        let cond = BinaryExpr::new(BinOp::Le, Expr::LValue(LValueExpr::name(var)), end);
        let increment = Expr::Assign(AssignExpr {
            target: LValueExpr::name(var),
            value: Box::new(BinaryExpr::new(
                BinOp::Add,
                Expr::LValue(LValueExpr::name(var)),
                Expr::Int(1),
            )),
        });
        let while_loop = Expr::While(WhileExpr {
            cond: Box::new(cond),
            body: Box::new(Expr::Seq(vec![body, increment])),
        });
        Ok(Expr::Let(LetExpr::new(
            vec![Decl::Var(VarDecl::new(var, None, start))],
            vec![while_loop],
        )))
    }

    /// `let decls in e1; e2; ... end`: body may be empty.
    fn parse_let(&mut self) -> ParseResult<Expr> {
        let decls = self.parse_declarations()?;
        self.expect_keyword(Keyword::In, "'in'")?;

        let mut body = Vec::new();
        if !self.eat_keyword(Keyword::End)? {
            loop {
                body.push(self.parse_expression()?);
                if !self.eat_sym(Sym::Semicolon)? {
                    break;
                }
            }
            self.expect_keyword(Keyword::End, "'end'")?;
        }
        Ok(Expr::Let(LetExpr::new(decls, body)))
    }

    /// Everything that begins with an identifier: record creation, array
    /// creation, function call, or a locator (optionally assigned to).
    fn parse_identifier_headed(&mut self, name: Symbol) -> ParseResult<Expr> {
        let next = self.lexer.peek(0)?;
        match next.kind {
            TokenKind::Sym(Sym::LBrace) => self.parse_record_creation(name),
            TokenKind::Sym(Sym::LParen) => self.parse_call(name),
            TokenKind::Sym(Sym::LBracket) => {
                // `T[n] of v` (array creation) and `a[i]...` (locator) are
                // only distinguished by the `of` after the bracket.
                self.lexer.next()?;
                let index = self.parse_expression()?;
                self.expect_sym(Sym::RBracket, "']'")?;
                if self.eat_keyword(Keyword::Of)? {
                    let init = self.parse_expression()?;
                    Ok(Expr::Array(ArrayExpr {
                        type_id: TypeRef::new(name),
                        length: Box::new(index),
                        init: Box::new(init),
                    }))
                } else {
                    self.parse_lvalue_rest(name, vec![Access::Index(index)])
                }
            }
            _ => self.parse_lvalue_rest(name, Vec::new()),
        }
    }

    /// `T { f1 = e1, ... }`: at least one field.
    fn parse_record_creation(&mut self, name: Symbol) -> ParseResult<Expr> {
        self.lexer.next()?; // '{'

        let mut fields = IndexMap::new();
        loop {
            let field = self.expect_ident("a field name")?;
            self.expect_sym(Sym::Eq, "'='")?;
            let value = self.parse_expression()?;
            fields.insert(field, value);
            if !self.eat_sym(Sym::Comma)? {
                break;
            }
        }
        self.expect_sym(Sym::RBrace, "'}'")?;

        Ok(Expr::Record(RecordExpr {
            type_id: TypeRef::new(name),
            fields,
        }))
    }

    /// `f(a, b, ...)`: arguments may be empty.
    fn parse_call(&mut self, name: Symbol) -> ParseResult<Expr> {
        self.lexer.next()?; // '('

        let mut args = Vec::new();
        if !self.eat_sym(Sym::RParen)? {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat_sym(Sym::Comma)? {
                    break;
                }
            }
            self.expect_sym(Sym::RParen, "')' to close the argument list")?;
        }

        Ok(Expr::Call(CallExpr {
            name,
            binding: Cell::new(None),
            args,
        }))
    }

    /// Continues a locator chain and, if `:=` follows, an assignment.
    fn parse_lvalue_rest(&mut self, name: Symbol, mut accesses: Vec<Access>) -> ParseResult<Expr> {
        loop {
            if self.eat_sym(Sym::Dot)? {
                let field = self.expect_ident("a field name after '.'")?;
                accesses.push(Access::Field(field));
            } else if self.eat_sym(Sym::LBracket)? {
                let index = self.parse_expression()?;
                self.expect_sym(Sym::RBracket, "']'")?;
                accesses.push(Access::Index(index));
            } else {
                break;
            }
        }

        let lvalue = LValueExpr::with_accesses(name, accesses);
        if self.eat_sym(Sym::Assign)? {
            let value = self.parse_expression()?;
            Ok(Expr::Assign(AssignExpr {
                target: lvalue,
                value: Box::new(value),
            }))
        } else {
            Ok(Expr::LValue(lvalue))
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_declarations(&mut self) -> ParseResult<Vec<Decl>> {
        let mut decls = Vec::new();
        loop {
            let token = self.lexer.peek(0)?;
            match token.kind {
                TokenKind::Keyword(Keyword::Type) => {
                    self.lexer.next()?;
                    decls.push(Decl::Type(self.parse_type_decl()?));
                }
                TokenKind::Keyword(Keyword::Var) => {
                    self.lexer.next()?;
                    decls.push(Decl::Var(self.parse_var_decl()?));
                }
                TokenKind::Keyword(Keyword::Function) => {
                    self.lexer.next()?;
                    decls.push(Decl::Func(Rc::new(self.parse_func_decl()?)));
                }
                TokenKind::Keyword(Keyword::Import) => {
                    let location = self.lexer.location(token.span);
                    return Err(ParseError::ImportUnsupported { location });
                }
                _ => return Ok(decls),
            }
        }
    }

    /// `type name = ty` (the `type` keyword is already consumed).
    fn parse_type_decl(&mut self) -> ParseResult<TypeDecl> {
        let name = self.expect_ident("a type name")?;
        self.expect_sym(Sym::Eq, "'='")?;
        let ty = self.parse_ty()?;
        Ok(TypeDecl::new(name, ty))
    }

    fn parse_ty(&mut self) -> ParseResult<Ty> {
        let token = self.lexer.next()?;
        match &token.kind {
            TokenKind::Ident(name) => Ok(Ty::Name(TypeRef::new(*name))),
            TokenKind::Keyword(Keyword::Array) => {
                self.expect_keyword(Keyword::Of, "'of'")?;
                let element = self.expect_ident("an element type name")?;
                Ok(Ty::Array(element))
            }
            TokenKind::Sym(Sym::LBrace) => {
                let mut fields = IndexMap::new();
                if !self.eat_sym(Sym::RBrace)? {
                    loop {
                        let field = self.expect_ident("a field name")?;
                        self.expect_sym(Sym::Colon, "':'")?;
                        let ty = self.expect_ident("a field type name")?;
                        fields.insert(field, TypeRef::new(ty));
                        if !self.eat_sym(Sym::Comma)? {
                            break;
                        }
                    }
                    self.expect_sym(Sym::RBrace, "'}'")?;
                }
                Ok(Ty::Record(fields))
            }
            _ => Err(self.unexpected("a type", token)),
        }
    }

    /// `var name : ty? := init` (the `var` keyword is already consumed).
    fn parse_var_decl(&mut self) -> ParseResult<VarDecl> {
        let name = self.expect_ident("a variable name")?;
        let ty = if self.eat_sym(Sym::Colon)? {
            Some(TypeRef::new(self.expect_ident("a type name")?))
        } else {
            None
        };
        self.expect_sym(Sym::Assign, "':='")?;
        let init = self.parse_expression()?;
        Ok(VarDecl::new(name, ty, init))
    }

    /// `function name(params) : ty? = body` (the `function` keyword is
    /// already consumed).
    fn parse_func_decl(&mut self) -> ParseResult<FuncDecl> {
        let name = self.expect_ident("a function name")?;
        self.expect_sym(Sym::LParen, "'('")?;

        let mut params = Vec::new();
        if !self.eat_sym(Sym::RParen)? {
            loop {
                let param = self.expect_ident("a parameter name")?;
                self.expect_sym(Sym::Colon, "':'")?;
                let ty = self.expect_ident("a parameter type name")?;
                params.push(Param::new(param, TypeRef::new(ty)));
                if !self.eat_sym(Sym::Comma)? {
                    break;
                }
            }
            self.expect_sym(Sym::RParen, "')' to close the parameter list")?;
        }

        let return_type = if self.eat_sym(Sym::Colon)? {
            Some(TypeRef::new(self.expect_ident("a return type name")?))
        } else {
            None
        };
        self.expect_sym(Sym::Eq, "'='")?;
        let body = self.parse_expression()?;

        Ok(FuncDecl::new(name, params, return_type, body))
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn convert_integer(
        &self,
        digits: Symbol,
        negative: bool,
        token: &Token,
    ) -> ParseResult<i64> {
        let text = if negative {
            format!("-{}", digits.as_str())
        } else {
            digits.as_str().to_owned()
        };
        text.parse::<i64>().map_err(|_| ParseError::IntegerOutOfRange {
            digits,
            location: self.lexer.location(token.span),
        })
    }

    fn unexpected(&self, expected: &str, token: Token) -> ParseError {
        let location = self.lexer.location(token.span);
        ParseError::Unexpected {
            expected: expected.to_owned(),
            token,
            location,
        }
    }

    fn expect_sym(&mut self, sym: Sym, expected: &str) -> ParseResult<Token> {
        let token = self.lexer.next()?;
        if token.is_sym(sym) {
            Ok(token)
        } else {
            Err(self.unexpected(expected, token))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword, expected: &str) -> ParseResult<Token> {
        let token = self.lexer.next()?;
        if token.is_keyword(keyword) {
            Ok(token)
        } else {
            Err(self.unexpected(expected, token))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> ParseResult<Symbol> {
        let token = self.lexer.next()?;
        match &token.kind {
            TokenKind::Ident(name) => Ok(*name),
            _ => Err(self.unexpected(expected, token)),
        }
    }

    fn eat_sym(&mut self, sym: Sym) -> ParseResult<bool> {
        if self.lexer.peek(0)?.is_sym(sym) {
            self.lexer.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> ParseResult<bool> {
        if self.lexer.peek(0)?.is_keyword(keyword) {
            self.lexer.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Expr {
        Parser::new(source, None).parse().expect(source)
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::new(source, None).parse().expect_err(source)
    }

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    fn lvalue(name: &str) -> Expr {
        Expr::LValue(LValueExpr::name(sym(name)))
    }

    #[test]
    fn parse_nil() {
        assert_eq!(parse("nil"), Expr::Nil);
    }

    #[test]
    fn parse_integer() {
        assert_eq!(parse("42"), Expr::Int(42));
    }

    #[test]
    fn parse_negative_integer() {
        assert_eq!(parse("-42"), Expr::Int(-42));
    }

    #[test]
    fn parse_most_negative_integer() {
        assert_eq!(parse("-9223372036854775808"), Expr::Int(i64::MIN));
    }

    #[test]
    fn integer_overflow_is_a_parse_error() {
        assert!(matches!(
            parse_err("9223372036854775808"),
            ParseError::IntegerOutOfRange { .. }
        ));
    }

    #[test]
    fn parse_string() {
        assert_eq!(parse("\"hello\""), Expr::Str("hello".to_string()));
    }

    #[test]
    fn parse_array_creation() {
        let expr = parse("int_array[10] of 0");
        assert_eq!(
            expr,
            Expr::Array(ArrayExpr {
                type_id: TypeRef::new(sym("int_array")),
                length: Box::new(Expr::Int(10)),
                init: Box::new(Expr::Int(0)),
            })
        );
    }

    #[test]
    fn parse_record_creation_preserves_field_order() {
        let Expr::Record(record) = parse("point { y = 2, x = 1 }") else {
            panic!("expected record creation");
        };
        let order: Vec<_> = record.fields.keys().map(|k| k.as_str()).collect();
        assert_eq!(order, vec!["y", "x"]);
    }

    #[test]
    fn record_creation_requires_fields() {
        assert!(matches!(
            parse_err("point { }"),
            ParseError::Unexpected { .. }
        ));
    }

    #[test]
    fn parse_plain_lvalue() {
        assert_eq!(parse("x"), lvalue("x"));
    }

    #[test]
    fn parse_record_access() {
        assert_eq!(
            parse("a.b"),
            Expr::LValue(LValueExpr::with_accesses(
                sym("a"),
                vec![Access::Field(sym("b"))]
            ))
        );
    }

    #[test]
    fn parse_array_access() {
        assert_eq!(
            parse("a[0]"),
            Expr::LValue(LValueExpr::with_accesses(
                sym("a"),
                vec![Access::Index(Expr::Int(0))]
            ))
        );
    }

    #[test]
    fn parse_computed_array_access() {
        assert_eq!(
            parse("a[b + 1]"),
            Expr::LValue(LValueExpr::with_accesses(
                sym("a"),
                vec![Access::Index(BinaryExpr::new(
                    BinOp::Add,
                    lvalue("b"),
                    Expr::Int(1)
                ))]
            ))
        );
    }

    #[test]
    fn parse_mixed_lvalue_chain() {
        assert_eq!(
            parse("a[b].c"),
            Expr::LValue(LValueExpr::with_accesses(
                sym("a"),
                vec![Access::Index(lvalue("b")), Access::Field(sym("c"))]
            ))
        );
    }

    #[test]
    fn spurious_lvalue_is_an_error() {
        assert!(matches!(parse_err("a."), ParseError::Unexpected { .. }));
    }

    #[test]
    fn parse_call_without_arguments() {
        assert_eq!(
            parse("f()"),
            Expr::Call(CallExpr {
                name: sym("f"),
                binding: Cell::new(None),
                args: vec![],
            })
        );
    }

    #[test]
    fn parse_call_with_arguments() {
        assert_eq!(
            parse("add(1, x)"),
            Expr::Call(CallExpr {
                name: sym("add"),
                binding: Cell::new(None),
                args: vec![Expr::Int(1), lvalue("x")],
            })
        );
    }

    #[test]
    fn parse_assignment() {
        assert_eq!(
            parse("x := 42"),
            Expr::Assign(AssignExpr {
                target: LValueExpr::name(sym("x")),
                value: Box::new(Expr::Int(42)),
            })
        );
    }

    #[test]
    fn parse_assignment_through_chain() {
        let Expr::Assign(assign) = parse("a[0].b := 1") else {
            panic!("expected assignment");
        };
        assert_eq!(assign.target.accesses.len(), 2);
    }

    #[test]
    fn parse_if_then() {
        assert_eq!(
            parse("if x then 1"),
            Expr::If(IfExpr {
                cond: Box::new(lvalue("x")),
                then_branch: Box::new(Expr::Int(1)),
                else_branch: None,
            })
        );
    }

    #[test]
    fn parse_if_then_else() {
        assert_eq!(
            parse("if x then 1 else 2"),
            Expr::If(IfExpr {
                cond: Box::new(lvalue("x")),
                then_branch: Box::new(Expr::Int(1)),
                else_branch: Some(Box::new(Expr::Int(2))),
            })
        );
    }

    #[test]
    fn parse_while() {
        assert_eq!(
            parse("while x do f()"),
            Expr::While(WhileExpr {
                cond: Box::new(lvalue("x")),
                body: Box::new(Expr::Call(CallExpr {
                    name: sym("f"),
                    binding: Cell::new(None),
                    args: vec![],
                })),
            })
        );
    }

    #[test]
    fn parse_break() {
        assert_eq!(parse("break"), Expr::Break);
    }

    #[test]
    fn for_desugars_to_let_and_while() {
        let i = sym("i");
        let body = Expr::Call(CallExpr {
            name: sym("f"),
            binding: Cell::new(None),
            args: vec![Expr::LValue(LValueExpr::name(i))],
        });
        let expected = Expr::Let(LetExpr::new(
            vec![Decl::Var(VarDecl::new(i, None, Expr::Int(1)))],
            vec![Expr::While(WhileExpr {
                cond: Box::new(BinaryExpr::new(
                    BinOp::Le,
                    Expr::LValue(LValueExpr::name(i)),
                    Expr::Int(9),
                )),
                body: Box::new(Expr::Seq(vec![
                    body,
                    Expr::Assign(AssignExpr {
                        target: LValueExpr::name(i),
                        value: Box::new(BinaryExpr::new(
                            BinOp::Add,
                            Expr::LValue(LValueExpr::name(i)),
                            Expr::Int(1),
                        )),
                    }),
                ])),
            })],
        ));

        assert_eq!(parse("for i := 1 to 9 do f(i)"), expected);
    }

    #[test]
    fn parse_empty_sequence() {
        assert_eq!(parse("()"), Expr::Seq(vec![]));
    }

    #[test]
    fn parse_single_item_sequence() {
        assert_eq!(parse("(42)"), Expr::Seq(vec![Expr::Int(42)]));
    }

    #[test]
    fn parse_multiple_item_sequence() {
        assert_eq!(
            parse("(1; 2; 3)"),
            Expr::Seq(vec![Expr::Int(1), Expr::Int(2), Expr::Int(3)])
        );
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse("2 + 2 * 3"),
            BinaryExpr::new(
                BinOp::Add,
                Expr::Int(2),
                BinaryExpr::new(BinOp::Mul, Expr::Int(2), Expr::Int(3)),
            )
        );
    }

    #[test]
    fn operators_are_left_associative() {
        assert_eq!(
            parse("10 - 4 - 3"),
            BinaryExpr::new(
                BinOp::Sub,
                BinaryExpr::new(BinOp::Sub, Expr::Int(10), Expr::Int(4)),
                Expr::Int(3),
            )
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            parse("(2 + 2) * 3"),
            BinaryExpr::new(
                BinOp::Mul,
                Expr::Seq(vec![BinaryExpr::new(
                    BinOp::Add,
                    Expr::Int(2),
                    Expr::Int(2)
                )]),
                Expr::Int(3),
            )
        );
    }

    #[test]
    fn comparison_binds_looser_than_arithmetic() {
        assert_eq!(
            parse("a + 1 < b * 2"),
            BinaryExpr::new(
                BinOp::Lt,
                BinaryExpr::new(BinOp::Add, lvalue("a"), Expr::Int(1)),
                BinaryExpr::new(BinOp::Mul, lvalue("b"), Expr::Int(2)),
            )
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse("a | b & c"),
            BinaryExpr::new(
                BinOp::Or,
                lvalue("a"),
                BinaryExpr::new(BinOp::And, lvalue("b"), lvalue("c")),
            )
        );
    }

    #[test]
    fn comparisons_bind_tighter_than_logic() {
        // x < y & y < z groups as (x < y) & (y < z).
        assert_eq!(
            parse("x < y & y < z"),
            BinaryExpr::new(
                BinOp::And,
                BinaryExpr::new(BinOp::Lt, lvalue("x"), lvalue("y")),
                BinaryExpr::new(BinOp::Lt, lvalue("y"), lvalue("z")),
            )
        );
    }

    #[test]
    fn parse_let_with_var_declaration() {
        let Expr::Let(let_expr) = parse("let var x := 42 in x end") else {
            panic!("expected let");
        };
        assert_eq!(
            let_expr.decls,
            vec![Decl::Var(VarDecl::new(sym("x"), None, Expr::Int(42)))]
        );
        assert_eq!(let_expr.body, vec![lvalue("x")]);
    }

    #[test]
    fn parse_var_declaration_with_type_annotation() {
        let Expr::Let(let_expr) = parse("let var x : int := 42 in x end") else {
            panic!("expected let");
        };
        assert_eq!(
            let_expr.decls,
            vec![Decl::Var(VarDecl::new(
                sym("x"),
                Some(TypeRef::new(sym("int"))),
                Expr::Int(42)
            ))]
        );
    }

    #[test]
    fn parse_type_declarations() {
        let Expr::Let(let_expr) =
            parse("let type a = int type b = array of int type c = { x : int, y : b } in () end")
        else {
            panic!("expected let");
        };
        assert_eq!(let_expr.decls.len(), 3);
        assert!(matches!(
            &let_expr.decls[0],
            Decl::Type(TypeDecl { ty: Ty::Name(_), .. })
        ));
        assert!(matches!(
            &let_expr.decls[1],
            Decl::Type(TypeDecl { ty: Ty::Array(element), .. }) if element.as_str() == "int"
        ));
        let Decl::Type(TypeDecl {
            ty: Ty::Record(fields),
            ..
        }) = &let_expr.decls[2]
        else {
            panic!("expected record type");
        };
        let order: Vec<_> = fields.keys().map(|k| k.as_str()).collect();
        assert_eq!(order, vec!["x", "y"]);
    }

    #[test]
    fn parse_function_declaration() {
        let Expr::Let(let_expr) = parse("let function add(a:int, b:int):int = a + b in () end")
        else {
            panic!("expected let");
        };
        let Decl::Func(func) = &let_expr.decls[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(func.name, sym("add"));
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.return_type, Some(TypeRef::new(sym("int"))));
    }

    #[test]
    fn parse_procedure_declaration() {
        let Expr::Let(let_expr) = parse("let function go() = f() in () end") else {
            panic!("expected let");
        };
        let Decl::Func(func) = &let_expr.decls[0] else {
            panic!("expected function declaration");
        };
        assert!(func.params.is_empty());
        assert_eq!(func.return_type, None);
    }

    #[test]
    fn parse_let_with_empty_body() {
        let Expr::Let(let_expr) = parse("let var x := 1 in end") else {
            panic!("expected let");
        };
        assert!(let_expr.body.is_empty());
    }

    #[test]
    fn parse_let_with_multiple_body_expressions() {
        let Expr::Let(let_expr) = parse("let var x := 1 in x := 2; x end") else {
            panic!("expected let");
        };
        assert_eq!(let_expr.body.len(), 2);
    }

    #[test]
    fn import_is_rejected() {
        assert!(matches!(
            parse_err("let import foo in () end"),
            ParseError::ImportUnsupported { .. }
        ));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse_err("1 2");
        assert!(matches!(err, ParseError::Unexpected { ref expected, .. }
            if expected == "end of file"));
    }

    #[test]
    fn parse_error_reports_token_and_location() {
        let err = Parser::new("if x do 1", Some("bad.tig"))
            .parse()
            .unwrap_err();
        assert_eq!(err.to_string(), "'do' at bad.tig:1:6: expected 'then'");
    }

    #[test]
    fn same_source_parses_equal() {
        let source = "let var a := 0 in (for i := 1 to 9 do a := a + i; a) end";
        assert_eq!(parse(source), parse(source));
    }

    #[test]
    fn record_and_array_lvalues_nest_arbitrarily() {
        let Expr::LValue(lv) = parse("m[i][j].cell.weight") else {
            panic!("expected lvalue");
        };
        assert_eq!(lv.accesses.len(), 4);
    }
}
