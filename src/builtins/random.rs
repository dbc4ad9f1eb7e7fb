use rand::Rng;

use crate::arena::Arena;
use crate::env::Env;
use crate::resolve::Context;
use crate::term::Term;

use super::{BuiltinResult, eval_list, eval_number, succeed, unify_into};

/// `prob(P)`: succeeds with probability `P`.
pub fn prob(args: &[Term], env: &Env, ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let p = eval_number(&args[0], env, arena)?;
    if ctx.rng.random::<f64>() < p {
        succeed(out, env);
    }
    Ok(())
}

/// `pick(List, X)`: one uniformly chosen element.
pub fn pick(args: &[Term], env: &Env, ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let items = eval_list(&args[0], env, arena)?;
    if items.is_empty() {
        return Ok(());
    }
    let idx = ctx.rng.random_range(0..items.len());
    unify_into(out, env, &args[1], &items[idx], arena);
    Ok(())
}

/// `rand(Lo, Hi, X)`: uniform float in `[Lo, Hi)`.
pub fn rand(args: &[Term], env: &Env, ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let lo = eval_number(&args[0], env, arena)?;
    let hi = eval_number(&args[1], env, arena)?;
    let value = lo + ctx.rng.random::<f64>() * (hi - lo);
    unify_into(out, env, &args[2], &arena.num(value), arena);
    Ok(())
}

/// `randint(Lo, Hi, X)`: integer in `[Lo, Hi)`; an empty span yields `Lo`.
pub fn randint(args: &[Term], env: &Env, ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let lo = i128::from(eval_number(&args[0], env, arena)?.floor() as i64);
    let hi = i128::from(eval_number(&args[1], env, arena)?.floor() as i64);
    let span = (hi - lo).max(1);
    let value = lo + ctx.rng.random_range(0..span);
    unify_into(out, env, &args[2], &arena.num(value as f64), arena);
    Ok(())
}
