//! `config.toml`: tempo, grid, quantization and engine limits.
//!
//! Every field has a default, so a partial file (or none at all) is valid.

use std::path::{Path, PathBuf};
use std::{error, fmt, fs, io};

use serde::{Deserialize, Serialize};

use crate::logger::Severity;
use crate::resolve::DEFAULT_MAX_DEPTH;
use crate::schedule::backend::AudioBackend;
use crate::schedule::transition::{DEFAULT_QUANTIZATION_BEATS, TransitionManager};
use crate::schedule::{DEFAULT_BPM, DEFAULT_GRID_BEATS, DEFAULT_LOOKAHEAD_MS, Scheduler};
use crate::session::{MAX_BPM, MIN_BPM};

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config: {}", e),
            ConfigError::Toml(e) => write!(f, "malformed config: {}", e),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {}", reason),
        }
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Toml(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Toml(e)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BogConfig {
    pub scheduler: SchedulerConfig,
    pub transition: TransitionConfig,
    pub engine: EngineConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SchedulerConfig {
    pub bpm: f64,
    pub swing: f64,
    pub lookahead_ms: f64,
    pub grid_beats: f64,
    /// Host loop cadence.
    pub tick_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            swing: 0.0,
            lookahead_ms: DEFAULT_LOOKAHEAD_MS,
            grid_beats: DEFAULT_GRID_BEATS,
            tick_ms: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TransitionConfig {
    pub quantization_beats: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            quantization_beats: DEFAULT_QUANTIZATION_BEATS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    pub max_depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LogConfig {
    pub level: Severity,
    pub file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Severity::Info,
            file: false,
        }
    }
}

impl BogConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: BogConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// `<config dir>/bog/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bog").join(CONFIG_FILE_NAME))
    }

    /// Reads the default file when it exists, defaults otherwise.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scheduler;
        if !(MIN_BPM..=MAX_BPM).contains(&s.bpm) {
            return Err(invalid(format!("bpm {} outside {}..={}", s.bpm, MIN_BPM, MAX_BPM)));
        }
        if !(0.0..=1.0).contains(&s.swing) {
            return Err(invalid(format!("swing {} outside 0..=1", s.swing)));
        }
        if s.lookahead_ms <= 0.0 || !s.lookahead_ms.is_finite() {
            return Err(invalid(format!("lookahead_ms must be positive, got {}", s.lookahead_ms)));
        }
        if s.grid_beats <= 0.0 || !s.grid_beats.is_finite() {
            return Err(invalid(format!("grid_beats must be positive, got {}", s.grid_beats)));
        }
        if s.tick_ms == 0 {
            return Err(invalid("tick_ms must be positive".to_string()));
        }
        let q = self.transition.quantization_beats;
        if q <= 0.0 || !q.is_finite() {
            return Err(invalid(format!("quantization_beats must be positive, got {}", q)));
        }
        if self.engine.max_depth == 0 {
            return Err(invalid("max_depth must be positive".to_string()));
        }
        Ok(())
    }

    /// A stopped scheduler configured from the `[scheduler]` and `[engine]` tables.
    pub fn scheduler<B: AudioBackend>(&self, backend: B) -> Scheduler<B> {
        let mut scheduler = Scheduler::new(backend).with_max_depth(self.engine.max_depth);
        if let Some(seed) = self.engine.seed {
            scheduler = scheduler.with_seed(seed);
        }
        let s = &self.scheduler;
        scheduler.configure(s.bpm, s.swing, s.lookahead_ms, s.grid_beats);
        scheduler
    }

    pub fn transition_manager(&self) -> TransitionManager {
        TransitionManager::new(self.transition.quantization_beats)
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid(reason)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::schedule::backend::RecordingBackend;

    #[test]
    fn empty_text_is_all_defaults() {
        let config = BogConfig::from_toml_str("").unwrap();
        assert_eq!(config, BogConfig::default());
        assert_eq!(config.scheduler.tick_ms, 20);
        assert_eq!(config.engine.max_depth, 512);
        assert_eq!(config.log.level, Severity::Info);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = BogConfig::from_toml_str(
            r#"
            [scheduler]
            bpm = 96.0
            swing = 0.2

            [engine]
            seed = 42

            [log]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.scheduler.bpm, 96.0);
        assert_eq!(config.scheduler.grid_beats, DEFAULT_GRID_BEATS);
        assert_eq!(config.engine.seed, Some(42));
        assert_eq!(config.log.level, Severity::Debug);
        assert_eq!(config.transition.quantization_beats, 4.0);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for text in [
            "[scheduler]\nbpm = 1000.0",
            "[scheduler]\nswing = 1.5",
            "[scheduler]\ngrid_beats = 0.0",
            "[transition]\nquantization_beats = -4.0",
            "[engine]\nmax_depth = 0",
        ] {
            assert!(matches!(BogConfig::from_toml_str(text), Err(ConfigError::Invalid(_))), "{}", text);
        }
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = BogConfig::from_toml_str("[scheduler\nbpm = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
        let err = BogConfig::from_toml_str("[scheduler]\nbpm = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[transition]\nquantization_beats = 8.0").unwrap();
        let config = BogConfig::load(file.path()).unwrap();
        assert_eq!(config.transition_manager().quantization_beats(), 8.0);

        let missing = BogConfig::load(Path::new("/no/such/bog/config.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn builds_a_configured_scheduler() {
        let config = BogConfig::from_toml_str("[scheduler]\nbpm = 140.0\nswing = 0.3\ngrid_beats = 0.5").unwrap();
        let scheduler = config.scheduler(RecordingBackend::new());
        assert_eq!(scheduler.bpm(), 140.0);
        assert_eq!(scheduler.swing(), 0.3);
        assert_eq!(scheduler.grid_beats(), 0.5);
        assert!(!scheduler.is_running());
    }
}
