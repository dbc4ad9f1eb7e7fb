use std::rc::Rc;

use crate::arena::Arena;
use crate::env::Env;
use crate::program::{Clause, Goal, GoalList};
use crate::term::Term;

/// Tolerance for numeric equality during unification.
pub const NUMBER_EPSILON: f64 = 1e-9;

/// Without an occurs check `X = f(X)` binds cyclically; expansion stops at this depth.
const MAX_SUBST_DEPTH: usize = 2048;

/// Follows variable bindings until reaching an unbound variable or a non-variable term.
pub fn walk<'a>(mut term: &'a Term, env: &'a Env) -> &'a Term {
    while let Term::Var(name) = term {
        match env.get(name) {
            Some(value) => term = value,
            None => break,
        }
    }
    term
}

/// Replaces every bound variable in `term` by its value, recursively.
pub fn subst(term: &Term, env: &Env, arena: &Arena) -> Term {
    subst_depth(term, env, arena, 0)
}

fn subst_depth(term: &Term, env: &Env, arena: &Arena, depth: usize) -> Term {
    if depth > MAX_SUBST_DEPTH {
        return term.clone();
    }
    match walk(term, env) {
        Term::Compound(name, args) => Term::Compound(
            name.clone(),
            args.iter().map(|a| subst_depth(a, env, arena, depth + 1)).collect(),
        ),
        Term::List(items, tail) => {
            let items: Vec<Term> = items
                .iter()
                .map(|i| subst_depth(i, env, arena, depth + 1))
                .collect();
            let tail = tail.as_ref().map(|t| subst_depth(t, env, arena, depth + 1));
            flatten_list(items, tail)
        }
        Term::Expr(op, l, r) => Term::Expr(
            *op,
            Rc::new(subst_depth(l, env, arena, depth + 1)),
            Rc::new(subst_depth(r, env, arena, depth + 1)),
        ),
        other => other.clone(),
    }
}

/// Joins a resolved tail into its list so `[1 | [2, 3]]` reads as `[1, 2, 3]`.
fn flatten_list(mut items: Vec<Term>, tail: Option<Term>) -> Term {
    match tail {
        Some(Term::List(more, rest)) => {
            items.extend(more.iter().cloned());
            Term::List(Rc::from(items), rest)
        }
        Some(other) => Term::List(Rc::from(items), Some(Rc::new(other))),
        None => Term::List(Rc::from(items), None),
    }
}

/// Structural unification. On success `env` holds the new bindings; on failure it
/// may hold partial bindings and must be discarded.
pub fn unify(a: &Term, b: &Term, env: &mut Env, arena: &Arena) -> bool {
    let left = walk(a, env).clone();
    let right = walk(b, env).clone();

    match (&left, &right) {
        (Term::Var(x), Term::Var(y)) if x == y => true,
        (Term::Var(x), _) => {
            env.bind(x.clone(), right.clone());
            true
        }
        (_, Term::Var(y)) => {
            env.bind(y.clone(), left.clone());
            true
        }
        (Term::Number(x), Term::Number(y)) => (x - y).abs() < NUMBER_EPSILON,
        (Term::Atom(x), Term::Atom(y)) => x == y,
        (Term::List(li, lt), Term::List(ri, rt)) => unify_lists(li, lt, ri, rt, env, arena),
        (Term::Expr(lo, ll, lr), Term::Expr(ro, rl, rr)) => {
            lo == ro && unify(ll, rl, env, arena) && unify(lr, rr, env, arena)
        }
        (Term::Compound(lf, la), Term::Compound(rf, ra)) => {
            lf == rf
                && la.len() == ra.len()
                && la.iter().zip(ra.iter()).all(|(l, r)| unify(l, r, env, arena))
        }
        _ => false,
    }
}

fn unify_lists(
    left_items: &[Term],
    left_tail: &Option<Rc<Term>>,
    right_items: &[Term],
    right_tail: &Option<Rc<Term>>,
    env: &mut Env,
    arena: &Arena,
) -> bool {
    let shared = left_items.len().min(right_items.len());
    for i in 0..shared {
        if !unify(&left_items[i], &right_items[i], env, arena) {
            return false;
        }
    }

    let rest = |items: &[Term], tail: &Option<Rc<Term>>| {
        arena.list(items[shared..].to_vec(), tail.as_deref().cloned())
    };

    if left_items.len() == right_items.len() {
        return match (left_tail, right_tail) {
            (None, None) => true,
            (Some(l), Some(r)) => unify(l, r, env, arena),
            (Some(l), None) => unify(l, &arena.list(Vec::new(), None), env, arena),
            (None, Some(r)) => unify(&arena.list(Vec::new(), None), r, env, arena),
        };
    }

    if left_items.len() < right_items.len() {
        match left_tail {
            Some(l) => unify(l, &rest(right_items, right_tail), env, arena),
            None => false,
        }
    } else {
        match right_tail {
            Some(r) => unify(&rest(left_items, left_tail), r, env, arena),
            None => false,
        }
    }
}

/// Gives every variable of a clause a fresh `Name$n` name.
///
/// One `n` is drawn per clause trial, so all occurrences of a variable inside
/// the clause stay linked while never clashing with another trial's names.
pub fn rename_clause(clause: &Clause, counter: &mut usize, arena: &Arena) -> Clause {
    let suffix = *counter;
    *counter += 1;
    Clause {
        head: rename_term(&clause.head, suffix, arena),
        body: rename_goals(&clause.body, suffix, arena),
    }
}

fn rename_goals(goals: &GoalList, suffix: usize, arena: &Arena) -> GoalList {
    goals
        .iter()
        .map(|goal| match goal {
            Goal::Term(t) => Goal::Term(rename_term(t, suffix, arena)),
            Goal::Not(branches) => Goal::Not(
                branches
                    .iter()
                    .map(|b| rename_goals(b, suffix, arena))
                    .collect(),
            ),
        })
        .collect()
}

fn rename_term(term: &Term, suffix: usize, arena: &Arena) -> Term {
    match term {
        Term::Var(name) => arena.var(&format!("{}${}", name, suffix)),
        Term::Compound(name, args) => Term::Compound(
            name.clone(),
            args.iter().map(|a| rename_term(a, suffix, arena)).collect(),
        ),
        Term::List(items, tail) => Term::List(
            items.iter().map(|i| rename_term(i, suffix, arena)).collect(),
            tail.as_ref().map(|t| Rc::new(rename_term(t, suffix, arena))),
        ),
        Term::Expr(op, l, r) => Term::Expr(
            *op,
            Rc::new(rename_term(l, suffix, arena)),
            Rc::new(rename_term(r, suffix, arena)),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn term(src: &str) -> Term {
        let program = parse(&format!("t({}).", src)).unwrap();
        program.clauses[0].head.args()[0].clone()
    }

    fn unifies(a: &str, b: &str) -> Option<Env> {
        let arena = Arena::new();
        let mut env = Env::new();
        unify(&term(a), &term(b), &mut env, &arena).then_some(env)
    }

    fn resolved(env: &Env, src: &str) -> String {
        subst(&term(src), env, &Arena::new()).to_string()
    }

    #[test]
    fn variables_bind_to_anything() {
        let env = unifies("X", "f(a, [1, 2])").unwrap();
        assert_eq!(resolved(&env, "X"), "f(a, [1, 2])");
    }

    #[test]
    fn numbers_unify_within_tolerance() {
        assert!(unifies("1", "1.0000000001").is_some());
        assert!(unifies("1", "1.001").is_none());
    }

    #[test]
    fn compounds_require_same_functor_and_arity() {
        assert!(unifies("f(X, b)", "f(a, Y)").is_some());
        assert!(unifies("f(a)", "g(a)").is_none());
        assert!(unifies("f(a)", "f(a, b)").is_none());
        assert!(unifies("f", "f()").is_none());
    }

    #[test]
    fn expressions_match_structurally_only() {
        assert!(unifies("X + 1", "2 + 1").is_some());
        assert!(unifies("1 + 1", "2").is_none());
        assert!(unifies("A * 2", "A + 2").is_none());
    }

    #[test]
    fn head_tail_matching_in_both_directions() {
        let env = unifies("[H | T]", "[1, 2, 3]").unwrap();
        assert_eq!(resolved(&env, "H"), "1");
        assert_eq!(resolved(&env, "T"), "[2, 3]");

        let env = unifies("[a, b, c]", "[A, B | Rest]").unwrap();
        assert_eq!(resolved(&env, "Rest"), "[c]");

        let env = unifies("[x | T]", "[x]").unwrap();
        assert_eq!(resolved(&env, "T"), "[]");

        assert!(unifies("[a, b]", "[a]").is_none());
        assert!(unifies("[a | T]", "[b, c]").is_none());
    }

    #[test]
    fn partial_lists_flatten_when_substituted() {
        let mut env = unifies("[1 | T]", "[1, 2 | U]").unwrap();
        assert!(unify(&term("U"), &term("[3]"), &mut env, &Arena::new()));
        assert_eq!(resolved(&env, "[1 | T]"), "[1, 2, 3]");
    }

    #[test]
    fn self_unification_adds_no_binding() {
        let env = unifies("X", "X").unwrap();
        assert!(env.is_empty());
    }

    #[test]
    fn unification_is_symmetric() {
        let cases = [
            ("f(X, b)", "f(a, Y)"),
            ("[H | T]", "[1, 2]"),
            ("[1, 2]", "[1]"),
            ("g(1, X)", "g(2, a)"),
            ("X + 1", "3 + Y"),
            ("p(X, X)", "p(a, b)"),
            ("p(X, X)", "p(a, a)"),
            ("abc", "abd"),
            ("[]", "[A | B]"),
        ];
        for (a, b) in cases {
            assert_eq!(
                unifies(a, b).is_some(),
                unifies(b, a).is_some(),
                "{} vs {}",
                a,
                b
            );
        }
    }

    #[test]
    fn renaming_keeps_variables_linked() {
        let program = parse("p(X, Y) :- q(X), \\+ r(Y).").unwrap();
        let arena = Arena::new();
        let mut counter = 7;
        let renamed = rename_clause(&program.clauses[0], &mut counter, &arena);
        assert_eq!(counter, 8);
        assert_eq!(renamed.to_string(), "p(X$7, Y$7) :- q(X$7), \\+ (r(Y$7)).");
    }
}
