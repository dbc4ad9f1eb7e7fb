use std::fmt;

use super::error::ParseError;

/// Operators made of more than one character, longest first.
const MULTI_SYMBOLS: [&str; 7] = ["=:=", "=\\=", "=<", ">=", ":-", "\\+", ":="];
const SINGLE_SYMBOLS: &str = "()[],.;|+-*/<>=";

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Sym(&'static str),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn is_sym(&self, sym: &str) -> bool {
        matches!(&self.kind, TokenKind::Sym(s) if *s == sym)
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(s) if s == name)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "'{}'", s),
            TokenKind::Number(n) => write!(f, "'{}'", crate::term::format_number(*n)),
            TokenKind::Sym(s) => write!(f, "'{}'", s),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

fn static_symbol(c: char) -> Option<&'static str> {
    let idx = SINGLE_SYMBOLS.find(c)?;
    Some(&SINGLE_SYMBOLS[idx..idx + c.len_utf8()])
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '%' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        let (line, column) = (self.line, self.column);
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        // A '.' only belongs to the number when digits follow; otherwise it ends the clause.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = &self.src[start..self.pos];
        text.parse::<f64>()
            .map_err(|_| ParseError::new(format!("malformed number '{}'", text), line, column))
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }
}

/// Splits source text into tokens, always ending with `Eof`.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        src,
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();

    loop {
        lexer.skip_trivia();
        let (line, column) = (lexer.line, lexer.column);
        let Some(c) = lexer.peek() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                line,
                column,
            });
            return Ok(tokens);
        };

        let kind = if c.is_ascii_digit() {
            TokenKind::Number(lexer.number()?)
        } else if c.is_ascii_alphabetic() || c == '_' {
            TokenKind::Ident(lexer.ident())
        } else if let Some(sym) = MULTI_SYMBOLS
            .iter()
            .find(|sym| lexer.src[lexer.pos..].starts_with(**sym))
        {
            for _ in 0..sym.chars().count() {
                lexer.bump();
            }
            TokenKind::Sym(*sym)
        } else if let Some(sym) = static_symbol(c) {
            lexer.bump();
            TokenKind::Sym(sym)
        } else {
            return Err(ParseError::new(
                format!("invalid character '{}'", c),
                line,
                column,
            ));
        };
        tokens.push(Token { kind, line, column });
    }
}
