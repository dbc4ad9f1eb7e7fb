use crate::program::{Goal, Program};
use crate::term::Term;

use super::parse;

mod errors;

pub fn parse_ok(source: &str) -> Program {
    match parse(source) {
        Ok(program) => program,
        Err(e) => panic!("{} failed to parse: {}", source, e),
    }
}

pub fn goal_term(goal: &Goal) -> &Term {
    match goal {
        Goal::Term(t) => t,
        Goal::Not(_) => panic!("expected a term goal, got {}", goal),
    }
}
