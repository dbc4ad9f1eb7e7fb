//! Grid scheduler: samples `event(Voice, Pitch, Vel, T)` at every grid point
//! inside the lookahead window and forwards each solution to the audio backend.
//!
//! The scheduler never runs on its own. A host loop calls [`Scheduler::tick`]
//! (or [`Scheduler::tick_at`]) every few tens of milliseconds; as long as the
//! lookahead covers the gap between two ticks no grid point is lost, and each
//! grid point is dispatched once.

use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::arena::Arena;
use crate::builtins::Builtins;
use crate::callbacks::{CallbackHandle, CallbackRegistry};
use crate::env::Env;
use crate::program::{Goal, Program};
use crate::resolve::{Context, DEFAULT_MAX_DEPTH, Resolver};
use crate::state::StateManager;
use crate::term::Term;
use crate::unify::subst;
use crate::{log_debug, log_info};

pub mod backend;
pub mod transition;

use backend::{AudioBackend, NullBackend, Voice, play};

pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_LOOKAHEAD_MS: f64 = 80.0;
pub const DEFAULT_GRID_BEATS: f64 = 0.25;
pub const DEFAULT_PITCH: f64 = 48.0;
pub const DEFAULT_VELOCITY: f64 = 0.7;

/// Tolerance when recovering a grid index from a dispatched time.
const GRID_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

/// Called with the new beat number on every beat crossing, and with 0 on stop.
pub type BeatCallback = dyn FnMut(i64);

/// Delays `t` by `swing` eighth notes when it falls on an odd eighth.
pub fn swing_adjust(t: f64, bpm: f64, swing: f64) -> f64 {
    let eighth = 60.0 / bpm / 2.0;
    let pos = (t / eighth).floor() as i64;
    if pos.rem_euclid(2) == 1 { t + swing * eighth } else { t }
}

pub struct Scheduler<B: AudioBackend = NullBackend> {
    backend: B,
    builtins: Builtins,
    program: Option<Rc<Program>>,
    state: StateManager,
    rng: StdRng,
    bpm: f64,
    swing: f64,
    lookahead_ms: f64,
    grid_beats: f64,
    max_depth: usize,
    transport: TransportState,
    current_beat: i64,
    last_dispatched: Option<f64>,
    beat_callbacks: CallbackRegistry<BeatCallback>,
}

impl<B: AudioBackend> Scheduler<B> {
    pub fn new(backend: B) -> Self {
        Scheduler {
            backend,
            builtins: Builtins::standard(),
            program: None,
            state: StateManager::new(),
            rng: StdRng::from_os_rng(),
            bpm: DEFAULT_BPM,
            swing: 0.0,
            lookahead_ms: DEFAULT_LOOKAHEAD_MS,
            grid_beats: DEFAULT_GRID_BEATS,
            max_depth: DEFAULT_MAX_DEPTH,
            transport: TransportState::Stopped,
            current_beat: 0,
            last_dispatched: None,
            beat_callbacks: CallbackRegistry::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_builtins(mut self, builtins: Builtins) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn set_program(&mut self, program: Rc<Program>) {
        log_info!("scheduler: program set ({} clauses)", program.len());
        self.program = Some(program);
    }

    pub fn clear_program(&mut self) {
        self.program = None;
    }

    pub fn program(&self) -> Option<&Rc<Program>> {
        self.program.as_ref()
    }

    /// Non-positive `bpm`, `lookahead_ms` or `grid_beats` keep the current
    /// value. `swing` is clamped to [0, 1].
    pub fn configure(&mut self, bpm: f64, swing: f64, lookahead_ms: f64, grid_beats: f64) {
        if bpm > 0.0 && bpm.is_finite() {
            self.bpm = bpm;
        }
        if !swing.is_nan() {
            self.swing = swing.clamp(0.0, 1.0);
        }
        if lookahead_ms > 0.0 && lookahead_ms.is_finite() {
            self.lookahead_ms = lookahead_ms;
        }
        if grid_beats > 0.0 && grid_beats.is_finite() {
            self.grid_beats = grid_beats;
        }
        log_info!(
            "scheduler: {} bpm, swing {}, lookahead {} ms, grid {} beats",
            self.bpm,
            self.swing,
            self.lookahead_ms,
            self.grid_beats
        );
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.configure(bpm, self.swing, 0.0, 0.0);
    }

    pub fn set_swing(&mut self, swing: f64) {
        self.configure(0.0, swing, 0.0, 0.0);
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn swing(&self) -> f64 {
        self.swing
    }

    pub fn lookahead_ms(&self) -> f64 {
        self.lookahead_ms
    }

    pub fn grid_beats(&self) -> f64 {
        self.grid_beats
    }

    pub fn beat_duration(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn start(&mut self) {
        self.backend.init();
        self.transport = TransportState::Running;
        log_info!("scheduler: started at {} bpm", self.bpm);
    }

    /// Halts ticking, forgets builtin state and fires beat callbacks with 0.
    pub fn stop(&mut self) {
        self.transport = TransportState::Stopped;
        self.current_beat = 0;
        self.last_dispatched = None;
        self.state.reset();
        log_info!("scheduler: stopped");
        self.notify_beat(0);
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn is_running(&self) -> bool {
        self.transport == TransportState::Running
    }

    pub fn current_beat(&self) -> i64 {
        self.current_beat
    }

    /// Backend clock, in seconds.
    pub fn now(&self) -> f64 {
        self.backend.time()
    }

    pub fn add_beat_callback(&mut self, callback: Box<BeatCallback>) -> CallbackHandle {
        self.beat_callbacks.add(callback)
    }

    pub fn remove_beat_callback(&mut self, handle: CallbackHandle) -> bool {
        self.beat_callbacks.remove(handle)
    }

    fn notify_beat(&mut self, beat: i64) {
        for callback in self.beat_callbacks.iter_mut() {
            callback(beat);
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateManager {
        &mut self.state
    }

    pub fn builtins_mut(&mut self) -> &mut Builtins {
        &mut self.builtins
    }

    /// Ticks at the backend's current time.
    pub fn tick(&mut self) -> usize {
        let now = self.now();
        self.tick_at(now)
    }

    /// Fires beat callbacks and dispatches every grid point not yet played
    /// in `[now, now + lookahead)`. Returns the number of triggers sent.
    pub fn tick_at(&mut self, now: f64) -> usize {
        if !self.is_running() {
            return 0;
        }
        let beat_duration = self.beat_duration();
        let beat = (now / beat_duration).floor() as i64;
        if beat != self.current_beat {
            self.current_beat = beat;
            self.notify_beat(beat);
        }

        let Some(program) = self.program.clone() else {
            return 0;
        };
        let step = beat_duration * self.grid_beats;
        let horizon = now + self.lookahead_ms / 1000.0;
        let mut k = (now / step).floor() as i64;
        if let Some(last) = self.last_dispatched {
            k = k.max((last / step + GRID_EPSILON).floor() as i64 + 1);
        }

        let mut fired = 0;
        loop {
            let t = k as f64 * step;
            if t >= horizon {
                break;
            }
            fired += self.dispatch(&program, t);
            self.last_dispatched = Some(t);
            k += 1;
        }
        fired
    }

    /// Resolves `event(Voice, Pitch, Vel, t)` and plays each solution.
    fn dispatch(&mut self, program: &Program, t: f64) -> usize {
        let arena = Arena::new();
        let voice_var = arena.var("Voice");
        let pitch_var = arena.var("Pitch");
        let vel_var = arena.var("Vel");
        let query = arena.compound(
            "event",
            vec![voice_var.clone(), pitch_var.clone(), vel_var.clone(), arena.num(t)],
        );
        let goals = [Goal::Term(query)];

        let solutions = {
            let mut ctx = Context::new(self.bpm, &mut self.state, &mut self.rng);
            Resolver::new(program, &self.builtins)
                .with_max_depth(self.max_depth)
                .solve(&goals, Env::new(), &mut ctx)
        };

        let time = swing_adjust(t, self.bpm, self.swing);
        let mut fired = 0;
        for env in &solutions {
            let voice = match subst(&voice_var, env, &arena) {
                Term::Atom(name) => match name.parse::<Voice>() {
                    Ok(voice) => voice,
                    Err(e) => {
                        log_debug!("event at {}: {}", t, e);
                        continue;
                    }
                },
                other => {
                    log_debug!("event at {}: voice {} is not an atom", t, other);
                    continue;
                }
            };
            let pitch = subst(&pitch_var, env, &arena)
                .eval_numeric()
                .unwrap_or(DEFAULT_PITCH);
            let velocity = subst(&vel_var, env, &arena)
                .eval_numeric()
                .map(|v| v.clamp(0.0, 1.0))
                .unwrap_or(DEFAULT_VELOCITY);
            play(&mut self.backend, voice, time, pitch, velocity);
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
mod tests;
