use crate::arena::Arena;
use crate::log_warn;
use crate::program::{Clause, GoalList, Program};

mod error;
pub mod expand;
pub mod grammar;
pub mod lexer;

pub use error::ParseError;
use grammar::Parser;

/// Parses a whole program. Any error aborts the parse; no partial program is returned.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let arena = Arena::new();
    parse_in(source, &arena)
}

/// Like [`parse`], allocating terms through the given arena.
pub fn parse_in(source: &str, arena: &Arena) -> Result<Program, ParseError> {
    let tokens = lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens, arena);
    let mut clauses = Vec::new();

    while !parser.at_eof() {
        let raw = parser.parse_clause()?;
        let body = match raw.body {
            None => Vec::new(),
            Some(node) => {
                let mut branches = expand::expand_goals(&node);
                if branches.len() > 1 {
                    // Only the first alternative of a clause body is kept.
                    log_warn!(
                        "clause {} has {} alternative bodies; only the first is kept",
                        raw.head,
                        branches.len()
                    );
                }
                branches.swap_remove(0)
            }
        };
        clauses.push(Clause {
            head: raw.head,
            body,
        });
    }

    Ok(Program::new(clauses))
}

/// Parses a goal expression, keeping every alternative. A trailing `.` is optional.
pub fn parse_query(text: &str) -> Result<Vec<GoalList>, ParseError> {
    let arena = Arena::new();
    let tokens = lexer::tokenize(text)?;
    let mut parser = Parser::new(tokens, &arena);
    let node = parser.parse_goal_or()?;
    parser.eat_sym(".");
    if !parser.at_eof() {
        parser.expect_sym(".")?;
    }
    Ok(expand::expand_goals(&node))
}

#[cfg(test)]
mod tests;
