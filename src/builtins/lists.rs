use crate::arena::Arena;
use crate::env::Env;
use crate::log_warn;
use crate::resolve::Context;
use crate::term::Term;

use super::{BuiltinResult, eval_list, eval_number, succeed, terms_equal, unify_into};

/// Upper bound on the values `range/4` enumerates.
pub const MAX_RANGE_VALUES: usize = 10_000;

/// `choose(List, X)`: one solution per element, in order.
pub fn choose(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let items = eval_list(&args[0], env, arena)?;
    for item in items.iter() {
        unify_into(out, env, &args[1], item, arena);
    }
    Ok(())
}

/// `cycle(List, X)`: successive calls step through the list, wrapping at its end.
///
/// Progress is kept in the state manager under the literal text of the list
/// argument as written, before substitution.
pub fn cycle(args: &[Term], env: &Env, ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let items = eval_list(&args[0], env, arena)?;
    if items.is_empty() {
        return Ok(());
    }
    let key = args[0].to_string();
    let idx = ctx.state.increment_cycle(&key, items.len());
    unify_into(out, env, &args[1], &items[idx % items.len()], arena);
    Ok(())
}

/// `rotate(List, Shift, Out)`: `Out` is `List` rotated left by `|Shift|`.
/// An empty list has no rotation.
pub fn rotate(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let items = eval_list(&args[0], env, arena)?;
    if items.is_empty() {
        return Ok(());
    }
    let shift = eval_number(&args[1], env, arena)? as i64;
    let len = items.len();
    let s = (shift.unsigned_abs() % len as u64) as usize;
    let rotated: Vec<Term> = (0..len).map(|i| items[(i + s) % len].clone()).collect();
    unify_into(out, env, &args[2], &arena.list(rotated, None), arena);
    Ok(())
}

/// `range(Start, End, Step, X)`: one solution per value from `Start` towards `End`
/// inclusive. The step's sign is ignored and a zero step counts as 1.
pub fn range(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let start = eval_number(&args[0], env, arena)?;
    let end = eval_number(&args[1], env, arena)?;
    let mut step = eval_number(&args[2], env, arena)?.abs();
    if step == 0.0 {
        step = 1.0;
    }
    let dir = if end >= start { 1.0 } else { -1.0 };

    for i in 0.. {
        let value = start + dir * step * i as f64;
        let inside = if dir > 0.0 { value <= end } else { value >= end };
        if !inside {
            break;
        }
        if i >= MAX_RANGE_VALUES {
            log_warn!("range({}, {}, {}) truncated to {} values", start, end, step, MAX_RANGE_VALUES);
            break;
        }
        unify_into(out, env, &args[3], &arena.num(value), arena);
    }
    Ok(())
}

/// `distinct(List)`: no two elements are equal.
pub fn distinct(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let items = eval_list(&args[0], env, arena)?;
    for (i, a) in items.iter().enumerate() {
        if items[i + 1..].iter().any(|b| terms_equal(a, b)) {
            return Ok(());
        }
    }
    succeed(out, env);
    Ok(())
}
