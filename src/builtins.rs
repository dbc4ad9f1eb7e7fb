use std::collections::HashMap;
use std::rc::Rc;
use std::{error, fmt};

use crate::arena::Arena;
use crate::env::Env;
use crate::resolve::Context;
use crate::term::{Symbol, Term};
use crate::unify::{NUMBER_EPSILON, subst, unify};

pub mod arith;
pub mod lists;
pub mod random;
pub mod rhythm;
pub mod theory;

/// Malformed builtin arguments. Logged by the resolver; the goal then has no solutions.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinError {
    ExpectedNumber(String),
    ExpectedList(String),
    ExpectedAtom(String),
    InvalidArgument(String),
}

impl fmt::Display for BuiltinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinError::ExpectedNumber(found) => write!(f, "expected a number, found {}", found),
            BuiltinError::ExpectedList(found) => write!(f, "expected a proper list, found {}", found),
            BuiltinError::ExpectedAtom(found) => write!(f, "expected an atom, found {}", found),
            BuiltinError::InvalidArgument(reason) => write!(f, "invalid argument: {}", reason),
        }
    }
}

impl error::Error for BuiltinError {}

pub type BuiltinResult = Result<(), BuiltinError>;

/// A native predicate. Each environment pushed to `out` is one solution.
pub type BuiltinFn = fn(&[Term], &Env, &mut Context<'_>, &mut Vec<Env>, &Arena) -> BuiltinResult;

#[derive(Clone, Copy)]
pub struct BuiltinDef {
    pub arity: usize,
    pub func: BuiltinFn,
}

impl fmt::Debug for BuiltinDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinDef(arity {})", self.arity)
    }
}

/// Builtin table, keyed by functor name then arity.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    table: HashMap<String, Vec<BuiltinDef>>,
}

impl Builtins {
    pub fn empty() -> Self {
        Builtins::default()
    }

    pub fn standard() -> Self {
        let mut b = Builtins::empty();

        // Comparison and arithmetic
        b.register("eq", 2, arith::eq);
        b.register("=", 2, arith::unify_goal);
        b.register("is", 2, arith::is);
        b.register("=:=", 2, arith::num_eq);
        b.register("=\\=", 2, arith::num_ne);
        b.register("<", 2, arith::lt);
        b.register(">", 2, arith::gt);
        b.register("=<", 2, arith::lte);
        b.register(">=", 2, arith::gte);
        b.register("lt", 2, arith::lt);
        b.register("gt", 2, arith::gt);
        b.register("lte", 2, arith::lte);
        b.register("gte", 2, arith::gte);
        b.register("add", 3, arith::add);

        // Gates
        b.register("within", 3, rhythm::within);
        b.register("cooldown", 3, rhythm::cooldown);
        b.register("distinct", 1, lists::distinct);

        // Time and rhythm
        b.register("every", 2, rhythm::every);
        b.register("beat", 2, rhythm::beat);
        b.register("phase", 3, rhythm::phase);
        b.register("euc", 5, rhythm::euc);

        // Theory
        b.register("scale", 5, theory::scale);
        b.register("chord", 4, theory::chord);
        b.register("transpose", 3, theory::transpose);

        // Lists and randomness
        b.register("choose", 2, lists::choose);
        b.register("cycle", 2, lists::cycle);
        b.register("rotate", 3, lists::rotate);
        b.register("range", 4, lists::range);
        b.register("pick", 2, random::pick);
        b.register("prob", 1, random::prob);
        b.register("rand", 3, random::rand);
        b.register("randint", 3, random::randint);

        b
    }

    /// Adds or replaces the builtin `name/arity`.
    pub fn register(&mut self, name: &str, arity: usize, func: BuiltinFn) {
        let defs = self.table.entry(name.to_string()).or_default();
        defs.retain(|d| d.arity != arity);
        defs.push(BuiltinDef { arity, func });
    }

    pub fn find(&self, name: &str, arity: usize) -> Option<&BuiltinDef> {
        self.table.get(name)?.iter().find(|d| d.arity == arity)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Sorted `name/arity` signatures.
    pub fn signatures(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .table
            .iter()
            .flat_map(|(name, defs)| defs.iter().map(move |d| format!("{}/{}", name, d.arity)))
            .collect();
        out.sort();
        out
    }
}

pub(crate) fn eval_number(term: &Term, env: &Env, arena: &Arena) -> Result<f64, BuiltinError> {
    let value = subst(term, env, arena);
    value
        .eval_numeric()
        .ok_or_else(|| BuiltinError::ExpectedNumber(value.to_string()))
}

pub(crate) fn eval_list(term: &Term, env: &Env, arena: &Arena) -> Result<Rc<[Term]>, BuiltinError> {
    match subst(term, env, arena) {
        Term::List(items, None) => Ok(items),
        other => Err(BuiltinError::ExpectedList(other.to_string())),
    }
}

pub(crate) fn eval_atom(term: &Term, env: &Env, arena: &Arena) -> Result<Symbol, BuiltinError> {
    match subst(term, env, arena) {
        Term::Atom(name) => Ok(name),
        other => Err(BuiltinError::ExpectedAtom(other.to_string())),
    }
}

/// Pushes `env` unchanged as one solution.
pub(crate) fn succeed(out: &mut Vec<Env>, env: &Env) {
    out.push(env.clone());
}

/// Pushes a solution when `a` unifies with `b`.
pub(crate) fn unify_into(out: &mut Vec<Env>, env: &Env, a: &Term, b: &Term, arena: &Arena) {
    let mut trial = env.clone();
    if unify(a, b, &mut trial, arena) {
        out.push(trial);
    }
}

/// Structural equality of substituted terms, numbers compared with tolerance.
pub(crate) fn terms_equal(a: &Term, b: &Term) -> bool {
    match (a, b) {
        (Term::Number(x), Term::Number(y)) => (x - y).abs() < NUMBER_EPSILON,
        (Term::Atom(x), Term::Atom(y)) | (Term::Var(x), Term::Var(y)) => x == y,
        (Term::Expr(lo, ll, lr), Term::Expr(ro, rl, rr)) => {
            lo == ro && terms_equal(ll, rl) && terms_equal(lr, rr)
        }
        (Term::Compound(lf, la), Term::Compound(rf, ra)) => {
            lf == rf && la.len() == ra.len() && la.iter().zip(ra.iter()).all(|(l, r)| terms_equal(l, r))
        }
        (Term::List(li, lt), Term::List(ri, rt)) => {
            li.len() == ri.len()
                && li.iter().zip(ri.iter()).all(|(l, r)| terms_equal(l, r))
                && match (lt, rt) {
                    (Some(l), Some(r)) => terms_equal(l, r),
                    (None, None) => true,
                    _ => false,
                }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests;
