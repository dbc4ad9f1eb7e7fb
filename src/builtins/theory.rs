use crate::arena::Arena;
use crate::env::Env;
use crate::resolve::Context;
use crate::term::Term;

use super::{BuiltinError, BuiltinResult, eval_atom, eval_number, unify_into};

pub const SCALES: &[(&str, &[i64])] = &[
    ("ionian", &[0, 2, 4, 5, 7, 9, 11]),
    ("dorian", &[0, 2, 3, 5, 7, 9, 10]),
    ("phrygian", &[0, 1, 3, 5, 7, 8, 10]),
    ("lydian", &[0, 2, 4, 6, 7, 9, 11]),
    ("mixolydian", &[0, 2, 4, 5, 7, 9, 10]),
    ("aeolian", &[0, 2, 3, 5, 7, 8, 10]),
    ("locrian", &[0, 1, 3, 5, 6, 8, 10]),
    ("major_pent", &[0, 2, 4, 7, 9]),
    ("minor_pent", &[0, 3, 5, 7, 10]),
    ("blues", &[0, 3, 5, 6, 7, 10]),
];

pub const CHORDS: &[(&str, &[i64])] = &[
    ("maj", &[0, 4, 7]),
    ("min", &[0, 3, 7]),
    ("sus2", &[0, 2, 7]),
    ("sus4", &[0, 5, 7]),
    ("dim", &[0, 3, 6]),
    ("aug", &[0, 4, 8]),
    ("maj7", &[0, 4, 7, 11]),
    ("dom7", &[0, 4, 7, 10]),
    ("min7", &[0, 3, 7, 10]),
];

fn lookup(table: &'static [(&'static str, &'static [i64])], name: &str) -> Option<&'static [i64]> {
    table.iter().find(|(n, _)| *n == name).map(|(_, steps)| *steps)
}

/// Pitch of a 1-based scale degree. Degrees past the scale length climb octaves;
/// the octave shift truncates toward zero, so degrees just below 1 stay in `octave`.
pub fn degree_pitch(root: f64, steps: &[i64], degree: i64, octave: f64) -> f64 {
    let count = steps.len() as i64;
    let zero_idx = degree.saturating_sub(1);
    let step = steps[zero_idx.rem_euclid(count) as usize];
    let octave_shift = zero_idx / count;
    root + step as f64 + 12.0 * (octave + octave_shift as f64)
}

/// `scale(Root, Mode, Degree, Octave, Pitch)`
pub fn scale(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let root = eval_number(&args[0], env, arena)?;
    let mode = eval_atom(&args[1], env, arena)?;
    let degree = eval_number(&args[2], env, arena)?;
    let octave = eval_number(&args[3], env, arena)?;
    let steps = lookup(SCALES, &mode)
        .ok_or_else(|| BuiltinError::InvalidArgument(format!("unknown scale '{}'", mode)))?;
    let pitch = degree_pitch(root, steps, degree as i64, octave);
    unify_into(out, env, &args[4], &arena.num(pitch), arena);
    Ok(())
}

/// `chord(Root, Quality, Octave, Pitch)`: one solution per chord tone, lowest first.
pub fn chord(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let root = eval_number(&args[0], env, arena)?;
    let quality = eval_atom(&args[1], env, arena)?;
    let octave = eval_number(&args[2], env, arena)?;
    let intervals = lookup(CHORDS, &quality)
        .ok_or_else(|| BuiltinError::InvalidArgument(format!("unknown chord '{}'", quality)))?;
    for interval in intervals {
        let pitch = root + *interval as f64 + 12.0 * octave;
        unify_into(out, env, &args[3], &arena.num(pitch), arena);
    }
    Ok(())
}

/// `transpose(Note, Offset, Out)`
pub fn transpose(args: &[Term], env: &Env, _ctx: &mut Context<'_>, out: &mut Vec<Env>, arena: &Arena) -> BuiltinResult {
    let note = eval_number(&args[0], env, arena)?;
    let offset = eval_number(&args[1], env, arena)?;
    unify_into(out, env, &args[2], &arena.num(note + offset), arena);
    Ok(())
}
