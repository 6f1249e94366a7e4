//! The Tiger scanner.
//!
//! Transforms source text into tokens by dispatching on the first character
//! of each lexeme. The scanner is pull-based: the parser requests tokens one
//! at a time, and a buffer in front of the scanner provides arbitrary
//! lookahead for [`Lexer::peek`].

use std::collections::VecDeque;

use thiserror::Error;
use tiger_util::{Location, Span};

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Sym, Token, TokenKind};
use tiger_util::Symbol;

/// Errors raised during scanning. All are fatal and carry the offending
/// location.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("{location}: unexpected character '{ch}'")]
    UnexpectedChar { ch: char, location: Location },

    #[error("{location}: unterminated string literal")]
    UnterminatedString { location: Location },

    #[error("{location}: unterminated comment")]
    UnterminatedComment { location: Location },

    #[error("{location}: invalid escape sequence '\\{ch}'")]
    InvalidEscape { ch: char, location: Location },

    #[error("{location}: expected two hex digits after '\\x'")]
    InvalidHexEscape { location: Location },

    #[error("{location}: escape value {value} is larger than a byte")]
    EscapeOutOfRange { value: u32, location: Location },
}

pub type LexResult<T> = Result<T, LexError>;

/// The main lexer for Tiger source code.
///
/// # Example
///
/// ```
/// use tiger_lex::{Lexer, Sym, TokenKind};
///
/// let mut lexer = Lexer::new("x := x + 1", None);
/// assert!(matches!(lexer.peek(1).unwrap().kind, TokenKind::Sym(Sym::Assign)));
/// assert!(matches!(lexer.next().unwrap().kind, TokenKind::Ident(_)));
/// ```
pub struct Lexer<'a> {
    cursor: Cursor<'a>,

    /// Name of the file being lexed, used in error locations.
    file: Option<String>,

    /// Tokens scanned ahead by `peek` but not yet consumed.
    buffer: VecDeque<Token>,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `source`. `file` names the source in
    /// diagnostics; pass `None` for non-file sources.
    pub fn new(source: &'a str, file: Option<&str>) -> Self {
        Self {
            cursor: Cursor::new(source),
            file: file.map(str::to_owned),
            buffer: VecDeque::new(),
        }
    }

    /// The file name this lexer reports errors against.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Builds an error location at the given span.
    pub fn location(&self, span: Span) -> Location {
        Location::new(self.file.clone(), span)
    }

    /// Looks at the `k`-th future token without consuming it (`k = 0` is the
    /// token `next` would return).
    pub fn peek(&mut self, k: usize) -> LexResult<Token> {
        while self.buffer.len() <= k {
            let token = self.scan_token()?;
            self.buffer.push_back(token);
        }
        Ok(self.buffer[k].clone())
    }

    /// Consumes and returns the next token. At end of input this returns an
    /// `Eof` token, indefinitely.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> LexResult<Token> {
        if let Some(token) = self.buffer.pop_front() {
            return Ok(token);
        }
        self.scan_token()
    }

    /// Scans every remaining token, excluding the final `Eof`.
    pub fn all(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next()?;
            if token.is_eof() {
                return Ok(tokens);
            }
            tokens.push(token);
        }
    }

    fn scan_token(&mut self) -> LexResult<Token> {
        self.skip_trivia()?;

        let span = self.cursor.span();
        if self.cursor.is_at_end() {
            return Ok(Token::new(TokenKind::Eof, span));
        }

        match self.cursor.current_char() {
            '"' => self.lex_string(span),
            c if c.is_ascii_digit() => Ok(self.lex_number(span)),
            c if c.is_ascii_alphabetic() => Ok(self.lex_identifier(span)),
            _ => self.lex_symbol(span),
        }
    }

    /// Skips whitespace, line terminators, and nested comments.
    fn skip_trivia(&mut self) -> LexResult<()> {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\r' | '\n' => self.cursor.advance(),
                '/' if self.cursor.peek_char(1) == '*' => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Consumes one `/* ... */` comment, honoring nesting.
    fn skip_comment(&mut self) -> LexResult<()> {
        let open_span = self.cursor.span();
        self.cursor.advance(); // '/'
        self.cursor.advance(); // '*'

        let mut depth = 1usize;
        while depth > 0 {
            if self.cursor.is_at_end() {
                return Err(LexError::UnterminatedComment {
                    location: self.location(open_span),
                });
            }
            match (self.cursor.current_char(), self.cursor.peek_char(1)) {
                ('/', '*') => {
                    depth += 1;
                    self.cursor.advance();
                    self.cursor.advance();
                }
                ('*', '/') => {
                    depth -= 1;
                    self.cursor.advance();
                    self.cursor.advance();
                }
                _ => self.cursor.advance(),
            }
        }
        Ok(())
    }

    /// Lexes an identifier or keyword: a leading ASCII letter followed by
    /// letters or digits.
    fn lex_identifier(&mut self, span: Span) -> Token {
        let start = self.cursor.position();
        while self.cursor.current_char().is_ascii_alphanumeric() {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);

        match keyword_from_ident(text) {
            Some(keyword) => Token::new(TokenKind::Keyword(keyword), span),
            None => Token::new(TokenKind::Ident(Symbol::intern(text)), span),
        }
    }

    /// Lexes a run of decimal digits. The digits are kept as text; the
    /// parser converts them (and owns the overflow error).
    fn lex_number(&mut self, span: Span) -> Token {
        let start = self.cursor.position();
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        let digits = self.cursor.slice_from(start);
        Token::new(TokenKind::Number(Symbol::intern(digits)), span)
    }

    /// Lexes a double-quoted string literal, decoding escapes.
    fn lex_string(&mut self, span: Span) -> LexResult<Token> {
        self.cursor.advance(); // opening quote

        let mut text = String::new();
        loop {
            if self.cursor.is_at_end() {
                return Err(LexError::UnterminatedString {
                    location: self.location(span),
                });
            }
            match self.cursor.current_char() {
                '"' => {
                    self.cursor.advance();
                    return Ok(Token::new(TokenKind::Str(text), span));
                }
                '\\' => {
                    self.cursor.advance();
                    let decoded = self.lex_escape()?;
                    text.push(decoded);
                }
                c => {
                    text.push(c);
                    self.cursor.advance();
                }
            }
        }
    }

    /// Decodes one escape sequence; the leading backslash is already
    /// consumed.
    fn lex_escape(&mut self) -> LexResult<char> {
        let span = self.cursor.span();
        let c = self.cursor.current_char();
        match c {
            '"' | '\\' => {
                self.cursor.advance();
                Ok(c)
            }
            'n' => {
                self.cursor.advance();
                Ok('\n')
            }
            'r' => {
                self.cursor.advance();
                Ok('\r')
            }
            't' => {
                self.cursor.advance();
                Ok('\t')
            }
            'b' => {
                self.cursor.advance();
                Ok('\u{0008}')
            }
            'x' => {
                self.cursor.advance();
                let mut value = 0u32;
                for _ in 0..2 {
                    let digit = self.cursor.current_char();
                    let Some(hex) = digit.to_digit(16) else {
                        return Err(LexError::InvalidHexEscape {
                            location: self.location(span),
                        });
                    };
                    value = value * 16 + hex;
                    self.cursor.advance();
                }
                Ok(char::from(value as u8))
            }
            c if c.is_ascii_digit() => {
                let mut value = 0u32;
                while self.cursor.current_char().is_ascii_digit() {
                    let digit = self.cursor.current_char().to_digit(10).unwrap_or(0);
                    value = value.saturating_mul(10).saturating_add(digit);
                    self.cursor.advance();
                }
                if value > 255 {
                    return Err(LexError::EscapeOutOfRange {
                        value,
                        location: self.location(span),
                    });
                }
                Ok(char::from(value as u8))
            }
            c => Err(LexError::InvalidEscape {
                ch: c,
                location: self.location(span),
            }),
        }
    }

    /// Lexes an operator or punctuation mark, including the multi-character
    /// forms `<=`, `>=`, `<>`, and `:=`.
    fn lex_symbol(&mut self, span: Span) -> LexResult<Token> {
        let c = self.cursor.current_char();
        self.cursor.advance();

        let sym = match c {
            ',' => Sym::Comma,
            ';' => Sym::Semicolon,
            '(' => Sym::LParen,
            ')' => Sym::RParen,
            '[' => Sym::LBracket,
            ']' => Sym::RBracket,
            '{' => Sym::LBrace,
            '}' => Sym::RBrace,
            '.' => Sym::Dot,
            '+' => Sym::Plus,
            '-' => Sym::Minus,
            '*' => Sym::Star,
            '/' => Sym::Slash,
            '=' => Sym::Eq,
            '&' => Sym::Amp,
            '|' => Sym::Pipe,
            ':' => {
                if self.cursor.match_char('=') {
                    Sym::Assign
                } else {
                    Sym::Colon
                }
            }
            '<' => {
                if self.cursor.match_char('=') {
                    Sym::Le
                } else if self.cursor.match_char('>') {
                    Sym::Ne
                } else {
                    Sym::Lt
                }
            }
            '>' => {
                if self.cursor.match_char('=') {
                    Sym::Ge
                } else {
                    Sym::Gt
                }
            }
            c => {
                return Err(LexError::UnexpectedChar {
                    ch: c,
                    location: self.location(span),
                })
            }
        };

        Ok(Token::new(TokenKind::Sym(sym), span))
    }
}
