use crate::arena::Arena;
use crate::term::{ArithOp, Term};

use super::error::ParseError;
use super::lexer::{Token, TokenKind};

/// Goal syntax before connective expansion.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalNode {
    Term(Term),
    And(Box<GoalNode>, Box<GoalNode>),
    Or(Box<GoalNode>, Box<GoalNode>),
    Not(Box<GoalNode>),
}

/// A parsed clause whose body has not been expanded yet.
pub struct RawClause {
    pub head: Term,
    pub body: Option<GoalNode>,
}

/// Comparison operator tokens and the builtin functor each one calls.
fn comparison_functor(tok: &Token) -> Option<&'static str> {
    match &tok.kind {
        TokenKind::Sym(s) => match *s {
            "=" => Some("="),
            "=:=" => Some("=:="),
            "=\\=" => Some("=\\="),
            "<" => Some("<"),
            ">" => Some(">"),
            "=<" => Some("=<"),
            ">=" => Some(">="),
            ":=" => Some("is"),
            _ => None,
        },
        TokenKind::Ident(s) if s == "is" => Some("is"),
        _ => None,
    }
}

fn is_arith_operator(tok: &Token) -> bool {
    matches!(&tok.kind, TokenKind::Sym(s) if ArithOp::from_symbol(s).is_some())
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    arena: &'a Arena,
    anonymous: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, arena: &'a Arena) -> Self {
        Parser {
            tokens,
            pos: 0,
            arena,
            anonymous: 0,
        }
    }

    fn peek(&self) -> &Token {
        // The token vector always ends with Eof, and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    pub fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn error_here(&self, info: String) -> ParseError {
        let tok = self.peek();
        ParseError::new(info, tok.line, tok.column)
    }

    fn unexpected(&self) -> ParseError {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Eof => self.error_here("unexpected end of input".to_string()),
            ref kind => self.error_here(format!("unexpected token {}", kind)),
        }
    }

    pub fn expect_sym(&mut self, sym: &str) -> Result<(), ParseError> {
        if self.peek().is_sym(sym) {
            self.advance();
            Ok(())
        } else {
            let found = self.peek().kind.to_string();
            Err(self.error_here(format!("expected '{}' but found {}", sym, found)))
        }
    }

    pub fn eat_sym(&mut self, sym: &str) -> bool {
        if self.peek().is_sym(sym) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// `clause := term (':-' goal_or)? '.'`
    pub fn parse_clause(&mut self) -> Result<RawClause, ParseError> {
        let (line, column) = (self.peek().line, self.peek().column);
        let head = self.parse_expression()?;
        if !matches!(head, Term::Atom(_) | Term::Compound(..)) {
            return Err(ParseError::new(
                format!("clause head must be an atom or compound term, found {}", head),
                line,
                column,
            ));
        }
        let body = if self.eat_sym(":-") {
            Some(self.parse_goal_or()?)
        } else {
            None
        };
        self.expect_sym(".")?;
        Ok(RawClause { head, body })
    }

    /// `goal_or := goal_and (';' goal_and)*`
    pub fn parse_goal_or(&mut self) -> Result<GoalNode, ParseError> {
        let mut left = self.parse_goal_and()?;
        while self.eat_sym(";") {
            let right = self.parse_goal_and()?;
            left = GoalNode::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_goal_and(&mut self) -> Result<GoalNode, ParseError> {
        let mut left = self.parse_goal_unary()?;
        while self.eat_sym(",") {
            let right = self.parse_goal_unary()?;
            left = GoalNode::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_goal_unary(&mut self) -> Result<GoalNode, ParseError> {
        if self.eat_sym("\\+") {
            let inner = self.parse_goal_unary()?;
            return Ok(GoalNode::Not(Box::new(inner)));
        }
        if self.peek().is_sym("(") {
            let start = self.pos;
            self.advance();
            let grouped = self
                .parse_goal_or()
                .and_then(|inner| self.expect_sym(")").map(|_| inner));
            match grouped {
                // `(X + 1) > 3` is arithmetic, not a goal group.
                Ok(inner) if !self.continues_expression() => return Ok(inner),
                _ => self.pos = start,
            }
        }
        self.parse_goal_term()
    }

    fn continues_expression(&self) -> bool {
        let tok = self.peek();
        comparison_functor(tok).is_some() || is_arith_operator(tok)
    }

    /// `goal_term := expr (cmp_op expr)?`
    fn parse_goal_term(&mut self) -> Result<GoalNode, ParseError> {
        let left = self.parse_expression()?;
        if let Some(functor) = comparison_functor(self.peek()) {
            self.advance();
            let right = self.parse_expression()?;
            let goal = self.arena.compound(functor, vec![left, right]);
            return Ok(GoalNode::Term(goal));
        }
        Ok(GoalNode::Term(left))
    }

    pub fn parse_expression(&mut self) -> Result<Term, ParseError> {
        let mut node = self.parse_multiplicative()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Sym("+") => ArithOp::Add,
                TokenKind::Sym("-") => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            node = self.arena.expr(op, node, right);
        }
        Ok(node)
    }

    fn parse_multiplicative(&mut self) -> Result<Term, ParseError> {
        let mut node = self.parse_unary()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Sym("*") => ArithOp::Mul,
                TokenKind::Sym("/") => ArithOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            node = self.arena.expr(op, node, right);
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Term, ParseError> {
        if !self.peek().is_sym("-") {
            return self.parse_primary();
        }
        self.advance();
        if let TokenKind::Number(n) = self.peek().kind {
            self.advance();
            return Ok(self.arena.num(-n));
        }
        let operand = self.parse_unary()?;
        Ok(self.arena.expr(ArithOp::Sub, self.arena.num(0.0), operand))
    }

    fn parse_primary(&mut self) -> Result<Term, ParseError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(self.arena.num(n))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.eat_sym("(") {
                    let args = self.parse_sequence(")")?;
                    self.expect_sym(")")?;
                    return Ok(self.arena.compound(&name, args));
                }
                Ok(self.name_term(&name))
            }
            TokenKind::Sym("[") => {
                self.advance();
                let items = self.parse_sequence("]")?;
                let tail = if !items.is_empty() && self.eat_sym("|") {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                self.expect_sym("]")?;
                Ok(self.arena.list(items, tail))
            }
            TokenKind::Sym("(") => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_sym(")")?;
                Ok(inner)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Comma separated expressions, possibly empty when `close` follows immediately.
    fn parse_sequence(&mut self, close: &str) -> Result<Vec<Term>, ParseError> {
        let mut items = Vec::new();
        if self.peek().is_sym(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if !self.eat_sym(",") {
                return Ok(items);
            }
        }
    }

    fn name_term(&mut self, name: &str) -> Term {
        if name == "_" {
            self.anonymous += 1;
            return self.arena.var(&format!("_#{}", self.anonymous));
        }
        let first = name.chars().next().unwrap_or('a');
        if first.is_ascii_uppercase() || first == '_' {
            self.arena.var(name)
        } else {
            self.arena.atom(name)
        }
    }
}
