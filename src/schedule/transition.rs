use std::rc::Rc;

use fraction::{CheckedAdd, CheckedDiv, CheckedMul, Fraction, One};

use crate::log_info;
use crate::program::Program;

use super::Scheduler;
use super::backend::AudioBackend;

pub const DEFAULT_QUANTIZATION_BEATS: f64 = 4.0;

/// Slack allowed when comparing the clock against a pending boundary.
const BOUNDARY_EPSILON: f64 = 1e-9;

struct PendingProgram {
    program: Rc<Program>,
    boundary: f64,
}

/// Holds a program until the next quantization boundary, then hands it to
/// the scheduler.
pub struct TransitionManager {
    quantization_beats: f64,
    pending: Option<PendingProgram>,
}

impl TransitionManager {
    /// Non-positive quantization falls back to 4 beats.
    pub fn new(quantization_beats: f64) -> Self {
        TransitionManager {
            quantization_beats: sanitize(quantization_beats),
            pending: None,
        }
    }

    pub fn quantization_beats(&self) -> f64 {
        self.quantization_beats
    }

    pub fn set_quantization_beats(&mut self, beats: f64) {
        self.quantization_beats = sanitize(beats);
    }

    /// Queues `program` for the first boundary at or after `now`, using the
    /// scheduler's tempo. Replaces any pending program. Returns the boundary.
    pub fn schedule<B: AudioBackend>(&mut self, program: Rc<Program>, now: f64, scheduler: &Scheduler<B>) -> f64 {
        let boundary = next_boundary(now, scheduler.beat_duration() * self.quantization_beats);
        log_info!("transition: program queued for {:.3}s", boundary);
        self.pending = Some(PendingProgram { program, boundary });
        boundary
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_boundary(&self) -> Option<f64> {
        self.pending.as_ref().map(|p| p.boundary)
    }

    /// Installs the pending program once `now` reaches its boundary.
    pub fn process<B: AudioBackend>(&mut self, now: f64, scheduler: &mut Scheduler<B>) -> bool {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|p| now + BOUNDARY_EPSILON >= p.boundary);
        if !due {
            return false;
        }
        match self.pending.take() {
            Some(pending) => {
                log_info!("transition: swapping program at {:.3}s", pending.boundary);
                scheduler.set_program(pending.program);
                true
            }
            None => false,
        }
    }
}

impl Default for TransitionManager {
    fn default() -> Self {
        Self::new(DEFAULT_QUANTIZATION_BEATS)
    }
}

fn sanitize(beats: f64) -> f64 {
    if beats > 0.0 && beats.is_finite() { beats } else { DEFAULT_QUANTIZATION_BEATS }
}

/// First multiple of `quantum` at or after `now`.
fn next_boundary(now: f64, quantum: f64) -> f64 {
    let fallback = {
        let phase = now.rem_euclid(quantum);
        if phase == 0.0 { now } else { now + (quantum - phase) }
    };
    exact_boundary(now, quantum)
        .filter(|boundary| boundary.is_finite())
        .unwrap_or(fallback)
}

/// Rational version of the boundary. `None` once the `u64` ratios would overflow.
fn exact_boundary(now: f64, quantum: f64) -> Option<f64> {
    let now_fraction = Fraction::from(now);
    let quantum_fraction = Fraction::from(quantum);
    let cycles = now_fraction.checked_div(&quantum_fraction)?;
    let floor = cycles.floor();
    let target = if cycles == floor {
        now_fraction
    } else {
        floor.checked_add(&Fraction::one())?.checked_mul(&quantum_fraction)?
    };
    f64::try_from(target).ok()
}
