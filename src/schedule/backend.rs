use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::log_info;

/// Synth voices an `event/4` solution may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Kick,
    Snare,
    Hat,
    Clap,
    Noise,
    Sine,
    Square,
    Triangle,
}

impl Voice {
    pub const ALL: [Voice; 8] = [
        Voice::Kick,
        Voice::Snare,
        Voice::Hat,
        Voice::Clap,
        Voice::Noise,
        Voice::Sine,
        Voice::Square,
        Voice::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Voice::Kick => "kick",
            Voice::Snare => "snare",
            Voice::Hat => "hat",
            Voice::Clap => "clap",
            Voice::Noise => "noise",
            Voice::Sine => "sine",
            Voice::Square => "square",
            Voice::Triangle => "triangle",
        }
    }

    /// Melodic voices take a pitch; drums ignore it.
    pub fn is_melodic(self) -> bool {
        matches!(self, Voice::Sine | Voice::Square | Voice::Triangle)
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Voice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Voice::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| format!("unknown voice '{}'", s))
    }
}

/// One scheduled note. `pitch` is `None` for drum voices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub voice: Voice,
    pub time: f64,
    pub pitch: Option<f64>,
    pub velocity: f64,
}

impl Trigger {
    pub fn drum(voice: Voice, time: f64, velocity: f64) -> Self {
        Trigger { voice, time, pitch: None, velocity }
    }

    pub fn melodic(voice: Voice, time: f64, pitch: f64, velocity: f64) -> Self {
        Trigger { voice, time, pitch: Some(pitch), velocity }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pitch {
            Some(p) => write!(f, "{:.3}s {} pitch {} vel {:.2}", self.time, self.voice, p, self.velocity),
            None => write!(f, "{:.3}s {} vel {:.2}", self.time, self.voice, self.velocity),
        }
    }
}

/// Sound output driven by the scheduler.
///
/// Every per-voice method funnels into [`AudioBackend::trigger`] unless
/// overridden, so a backend that treats voices uniformly only implements
/// `time` and `trigger`. Calls must not block.
pub trait AudioBackend {
    fn init(&mut self) {}

    /// Current audio clock, in seconds.
    fn time(&self) -> f64;

    fn trigger(&mut self, _trigger: &Trigger) {}

    fn kick(&mut self, time: f64, velocity: f64) {
        self.trigger(&Trigger::drum(Voice::Kick, time, velocity));
    }

    fn snare(&mut self, time: f64, velocity: f64) {
        self.trigger(&Trigger::drum(Voice::Snare, time, velocity));
    }

    fn hat(&mut self, time: f64, velocity: f64) {
        self.trigger(&Trigger::drum(Voice::Hat, time, velocity));
    }

    fn clap(&mut self, time: f64, velocity: f64) {
        self.trigger(&Trigger::drum(Voice::Clap, time, velocity));
    }

    fn noise(&mut self, time: f64, velocity: f64) {
        self.trigger(&Trigger::drum(Voice::Noise, time, velocity));
    }

    fn sine(&mut self, time: f64, pitch: f64, velocity: f64) {
        self.trigger(&Trigger::melodic(Voice::Sine, time, pitch, velocity));
    }

    fn square(&mut self, time: f64, pitch: f64, velocity: f64) {
        self.trigger(&Trigger::melodic(Voice::Square, time, pitch, velocity));
    }

    fn triangle(&mut self, time: f64, pitch: f64, velocity: f64) {
        self.trigger(&Trigger::melodic(Voice::Triangle, time, pitch, velocity));
    }
}

/// Routes a voice to its backend method.
pub(crate) fn play<B: AudioBackend + ?Sized>(backend: &mut B, voice: Voice, time: f64, pitch: f64, velocity: f64) {
    match voice {
        Voice::Kick => backend.kick(time, velocity),
        Voice::Snare => backend.snare(time, velocity),
        Voice::Hat => backend.hat(time, velocity),
        Voice::Clap => backend.clap(time, velocity),
        Voice::Noise => backend.noise(time, velocity),
        Voice::Sine => backend.sine(time, pitch, velocity),
        Voice::Square => backend.square(time, pitch, velocity),
        Voice::Triangle => backend.triangle(time, pitch, velocity),
    }
}

/// Wall clock only; triggers are dropped.
#[derive(Debug)]
pub struct NullBackend {
    origin: Instant,
}

impl NullBackend {
    pub fn new() -> Self {
        NullBackend { origin: Instant::now() }
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for NullBackend {
    fn time(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Wall clock; every trigger is written to the log.
#[derive(Debug)]
pub struct LogBackend {
    origin: Instant,
    played: usize,
}

impl LogBackend {
    pub fn new() -> Self {
        LogBackend { origin: Instant::now(), played: 0 }
    }

    pub fn played(&self) -> usize {
        self.played
    }
}

impl Default for LogBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for LogBackend {
    fn init(&mut self) {
        self.origin = Instant::now();
        log_info!("log backend ready");
    }

    fn time(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn trigger(&mut self, trigger: &Trigger) {
        self.played += 1;
        log_info!("{}", trigger);
    }
}

/// Manually clocked backend that keeps every trigger. Used by hosts that
/// render offline and by tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub now: f64,
    pub inits: usize,
    pub triggers: Vec<Trigger>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&mut self, now: f64) {
        self.now = now;
    }

    /// Drains recorded triggers.
    pub fn take(&mut self) -> Vec<Trigger> {
        std::mem::take(&mut self.triggers)
    }
}

impl AudioBackend for RecordingBackend {
    fn init(&mut self) {
        self.inits += 1;
    }

    fn time(&self) -> f64 {
        self.now
    }

    fn trigger(&mut self, trigger: &Trigger) {
        self.triggers.push(*trigger);
    }
}
