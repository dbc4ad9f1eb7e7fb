//! Compile-time connective expansion.
//!
//! A goal tree of `,`, `;` and `\+` becomes a list of alternative goal
//! sequences, so resolution only ever walks flat lists:
//! conjunction is the cartesian product of both sides, disjunction
//! concatenates the alternatives, and negation wraps its operand's
//! alternatives into a single `Goal::Not`.

use crate::program::{Goal, GoalList};

use super::grammar::GoalNode;

pub fn expand_goals(node: &GoalNode) -> Vec<GoalList> {
    match node {
        GoalNode::Term(term) => vec![vec![Goal::Term(term.clone())]],
        GoalNode::Not(inner) => vec![vec![Goal::Not(expand_goals(inner))]],
        GoalNode::And(left, right) => concat(expand_goals(left), expand_goals(right)),
        GoalNode::Or(left, right) => {
            let mut out = expand_goals(left);
            out.extend(expand_goals(right));
            out
        }
    }
}

fn concat(left: Vec<GoalList>, right: Vec<GoalList>) -> Vec<GoalList> {
    let mut out = Vec::with_capacity(left.len() * right.len());
    for l in &left {
        for r in &right {
            let mut seq = Vec::with_capacity(l.len() + r.len());
            seq.extend(l.iter().cloned());
            seq.extend(r.iter().cloned());
            out.push(seq);
        }
    }
    out
}
