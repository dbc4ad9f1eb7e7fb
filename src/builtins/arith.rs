use crate::arena::Arena;
use crate::env::Env;
use crate::resolve::Context;
use crate::term::Term;
use crate::unify::{NUMBER_EPSILON, subst};

use super::{BuiltinResult, eval_number, succeed, terms_equal, unify_into};

/// `eq(A, B)`: structural equality after substitution, no binding.
pub fn eq(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let left = subst(&args[0], env, arena);
    let right = subst(&args[1], env, arena);
    if terms_equal(&left, &right) {
        succeed(out, env);
    }
    Ok(())
}

/// `A = B`: unification.
pub fn unify_goal(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    unify_into(out, env, &args[0], &args[1], arena);
    Ok(())
}

/// `X is Expr`: evaluates the right side and unifies the left with the result.
pub fn is(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let value = eval_number(&args[1], env, arena)?;
    unify_into(out, env, &args[0], &arena.num(value), arena);
    Ok(())
}

fn compare(
    args: &[Term],
    env: &Env,
    out: &mut Vec<Env>,
    arena: &Arena,
    test: fn(f64, f64) -> bool,
) -> BuiltinResult {
    let a = eval_number(&args[0], env, arena)?;
    let b = eval_number(&args[1], env, arena)?;
    if test(a, b) {
        succeed(out, env);
    }
    Ok(())
}

pub fn num_eq(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    compare(args, env, out, arena, |a, b| (a - b).abs() < NUMBER_EPSILON)
}

pub fn num_ne(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    compare(args, env, out, arena, |a, b| (a - b).abs() >= NUMBER_EPSILON)
}

pub fn lt(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    compare(args, env, out, arena, |a, b| a < b)
}

pub fn gt(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    compare(args, env, out, arena, |a, b| a > b)
}

pub fn lte(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    compare(args, env, out, arena, |a, b| a <= b)
}

pub fn gte(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    compare(args, env, out, arena, |a, b| a >= b)
}

/// `add(A, B, Sum)`
pub fn add(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let a = eval_number(&args[0], env, arena)?;
    let b = eval_number(&args[1], env, arena)?;
    unify_into(out, env, &args[2], &arena.num(a + b), arena);
    Ok(())
}
