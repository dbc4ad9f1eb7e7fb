use serde::{Deserialize, Serialize};
use std::fmt;

use crate::term::Term;

/// One step of a goal sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Goal {
    Term(Term),
    /// Negation as failure over pre-expanded alternatives.
    Not(Vec<GoalList>),
}

pub type GoalList = Vec<Goal>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub head: Term,
    pub body: GoalList,
}

impl Clause {
    pub fn fact(head: Term) -> Self {
        Clause {
            head,
            body: Vec::new(),
        }
    }

    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }
}

/// Clauses in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub clauses: Vec<Clause>,
}

impl Program {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Program { clauses }
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clause> {
        self.clauses.iter()
    }

    /// Distinct `name/arity` pairs in order of first definition.
    pub fn predicates(&self) -> Vec<(String, usize)> {
        let mut out: Vec<(String, usize)> = Vec::new();
        for clause in &self.clauses {
            if let Some((name, arity)) = clause.head.functor() {
                if !out.iter().any(|(n, a)| n == name && *a == arity) {
                    out.push((name.to_string(), arity));
                }
            }
        }
        out
    }
}

fn write_goals(f: &mut fmt::Formatter<'_>, goals: &[Goal]) -> fmt::Result {
    for (i, goal) in goals.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", goal)?;
    }
    Ok(())
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Term(t) => write!(f, "{}", t),
            Goal::Not(branches) => {
                write!(f, "\\+ (")?;
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ; ")?;
                    }
                    write_goals(f, branch)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if !self.body.is_empty() {
            write!(f, " :- ")?;
            write_goals(f, &self.body)?;
        }
        write!(f, ".")
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clause in &self.clauses {
            writeln!(f, "{}", clause)?;
        }
        Ok(())
    }
}
