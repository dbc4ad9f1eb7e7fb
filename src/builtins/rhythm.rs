//! Time gates. `T` arguments are seconds; beat positions come from the context BPM.

use crate::arena::Arena;
use crate::env::Env;
use crate::resolve::Context;
use crate::term::Term;

use super::{BuiltinError, BuiltinResult, eval_number, succeed};

/// How close a position must be to a grid line to count as on it.
const GRID_EPSILON: f64 = 1e-4;

fn beats_at(seconds: f64, bpm: f64) -> f64 {
    seconds * bpm / 60.0
}

fn on_grid(value: f64) -> bool {
    (value - value.round()).abs() < GRID_EPSILON
}

/// `within(T, Lo, Hi)`: inclusive range check.
pub fn within(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let t = eval_number(&args[0], env, arena)?;
    let lo = eval_number(&args[1], env, arena)?;
    let hi = eval_number(&args[2], env, arena)?;
    if t >= lo && t <= hi {
        succeed(out, env);
    }
    Ok(())
}

/// `cooldown(Now, Last, Gap)`: at least `Gap` seconds separate `Last` and `Now`.
pub fn cooldown(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let now = eval_number(&args[0], env, arena)?;
    let last = eval_number(&args[1], env, arena)?;
    let gap = eval_number(&args[2], env, arena)?;
    if now - last >= gap {
        succeed(out, env);
    }
    Ok(())
}

/// `every(T, Step)`: `T` falls on a multiple of `Step` beats.
pub fn every(args: &[Term], env: &Env, ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let t = eval_number(&args[0], env, arena)?;
    let step = eval_number(&args[1], env, arena)?;
    if step <= 0.0 {
        return Err(BuiltinError::InvalidArgument(format!("every step must be positive, got {}", step)));
    }
    if on_grid(beats_at(t, ctx.bpm) / step) {
        succeed(out, env);
    }
    Ok(())
}

/// `beat(T, N)`: `T` falls on a 1/N beat subdivision.
pub fn beat(args: &[Term], env: &Env, ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let t = eval_number(&args[0], env, arena)?;
    let n = eval_number(&args[1], env, arena)?;
    if on_grid(beats_at(t, ctx.bpm) * n) {
        succeed(out, env);
    }
    Ok(())
}

/// `phase(T, N, K)`: on an N-steps-per-beat grid, `T` sits on step K (mod N).
pub fn phase(args: &[Term], env: &Env, ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let t = eval_number(&args[0], env, arena)?;
    let n = eval_number(&args[1], env, arena)?;
    let k = eval_number(&args[2], env, arena)?;
    let steps = n as i64;
    if steps <= 0 {
        return Err(BuiltinError::InvalidArgument(format!("phase needs at least one step, got {}", n)));
    }
    let pos = (beats_at(t, ctx.bpm) * n).round() as i64;
    if pos.rem_euclid(steps) == (k as i64).rem_euclid(steps) {
        succeed(out, env);
    }
    Ok(())
}

/// Step index of `t` in a cycle of `steps` steps spanning `cycle_beats` beats.
fn step_index(t: f64, steps: i64, cycle_beats: f64, bpm: f64) -> i64 {
    let cycles = beats_at(t, bpm) / cycle_beats;
    ((cycles * steps as f64).round() as i64).rem_euclid(steps)
}

/// `euc(T, K, N, B, R)`: Euclidean rhythm of K onsets over N steps, one cycle
/// every B beats, rotated by R steps.
pub fn euc(args: &[Term], env: &Env, ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let t = eval_number(&args[0], env, arena)?;
    let k = eval_number(&args[1], env, arena)?;
    let n = eval_number(&args[2], env, arena)?;
    let b = eval_number(&args[3], env, arena)?;
    let r = eval_number(&args[4], env, arena)?;

    if !(k.is_finite() && n.is_finite() && n >= 1.0 && k >= 0.0 && k <= n) {
        return Ok(());
    }
    if b <= 0.0 {
        return Err(BuiltinError::InvalidArgument(format!("euc cycle length must be positive, got {}", b)));
    }

    let steps = i128::from(n as i64);
    let onsets = i128::from(k as i64);
    let s = i128::from(step_index(t, n as i64, b, ctx.bpm));
    let rotated = (s + i128::from(r as i64).rem_euclid(steps)) % steps;
    if (rotated * onsets) % steps < onsets {
        succeed(out, env);
    }
    Ok(())
}
