use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::{File, OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock};

/// Global logger instance
static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Log file configuration
const LOG_FILE_MAX_SIZE: u64 = 1024 * 1024; // 1MB
const LOG_FILE_MAX_COUNT: usize = 5;
const LOG_FILE_NAME: &str = "bog.log";

/// Severity of a log message, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Fatal => write!(f, "[FATAL]"),
            Severity::Error => write!(f, "[ERROR]"),
            Severity::Warn => write!(f, "[WARN]"),
            Severity::Info => write!(f, "[INFO]"),
            Severity::Debug => write!(f, "[DEBUG]"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fatal" => Ok(Severity::Fatal),
            "error" => Ok(Severity::Error),
            "warn" | "warning" => Ok(Severity::Warn),
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// A structured log message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: Severity,
    pub msg: String,
}

impl LogMessage {
    pub fn new(level: Severity, msg: String) -> Self {
        LogMessage { level, msg }
    }
}

impl Display for LogMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.level, self.msg)
    }
}

/// File-based log writer with rotation
#[derive(Debug)]
pub struct LogFileWriter {
    log_dir: PathBuf,
    current_file: Option<File>,
    current_size: u64,
}

impl LogFileWriter {
    pub fn new() -> Result<Self, std::io::Error> {
        Self::in_dir(Self::default_log_directory())
    }

    /// Writer rooted at an explicit directory.
    pub fn in_dir(log_dir: PathBuf) -> Result<Self, std::io::Error> {
        create_dir_all(&log_dir)?;
        Ok(LogFileWriter {
            log_dir,
            current_file: None,
            current_size: 0,
        })
    }

    fn default_log_directory() -> PathBuf {
        let mut path = dirs::config_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        path.push("bog");
        path.push("logs");
        path
    }

    fn current_log_path(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    fn rotate_logs(&mut self) -> Result<(), std::io::Error> {
        let current_path = self.current_log_path();
        self.current_file = None;

        for i in (1..LOG_FILE_MAX_COUNT).rev() {
            let old_path = self.log_dir.join(format!("{}.{}", LOG_FILE_NAME, i));
            if !old_path.exists() {
                continue;
            }
            if i == LOG_FILE_MAX_COUNT - 1 {
                std::fs::remove_file(&old_path)?;
            } else {
                let new_path = self.log_dir.join(format!("{}.{}", LOG_FILE_NAME, i + 1));
                std::fs::rename(&old_path, &new_path)?;
            }
        }

        if current_path.exists() {
            let archived_path = self.log_dir.join(format!("{}.1", LOG_FILE_NAME));
            std::fs::rename(&current_path, &archived_path)?;
        }

        self.current_size = 0;
        Ok(())
    }

    fn ensure_file_open(&mut self) -> Result<(), std::io::Error> {
        if self.current_file.is_none() {
            let path = self.current_log_path();
            self.current_file = Some(OpenOptions::new().create(true).append(true).open(&path)?);
            if let Ok(metadata) = std::fs::metadata(&path) {
                self.current_size = metadata.len();
            }
        }
        Ok(())
    }

    pub fn write_log(&mut self, log_msg: &LogMessage) -> Result<(), std::io::Error> {
        self.ensure_file_open()?;

        let formatted_log = format!("{}\n", log_msg);
        let log_bytes = formatted_log.as_bytes();

        if self.current_size + log_bytes.len() as u64 > LOG_FILE_MAX_SIZE {
            self.rotate_logs()?;
            self.ensure_file_open()?;
        }

        if let Some(ref mut file) = self.current_file {
            file.write_all(log_bytes)?;
            file.flush()?;
            self.current_size += log_bytes.len() as u64;
        }

        Ok(())
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.current_log_path()
    }
}

/// Logger operating mode
#[derive(Debug, Clone)]
pub enum LoggerMode {
    /// Logs directly to the terminal
    Standalone,
    /// Forwards messages to a host channel (REPL, editor integration)
    Embedded(Sender<LogMessage>),
    /// Logs to the rotating file only
    File,
    /// Logs to file and terminal
    Full,
    /// Drops everything
    Silent,
}

pub struct Logger {
    mode: Arc<Mutex<LoggerMode>>,
    file_writer: Arc<Mutex<Option<LogFileWriter>>>,
    min_level: Arc<Mutex<Severity>>,
}

fn open_file_writer() -> Option<LogFileWriter> {
    match LogFileWriter::new() {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!("Failed to create log file writer: {}", e);
            None
        }
    }
}

fn write_to_terminal(log_msg: &LogMessage) {
    match log_msg.level {
        Severity::Fatal | Severity::Error => {
            eprintln!("{}", log_msg);
            let _ = std::io::stderr().flush();
        }
        _ => {
            println!("{}", log_msg);
            let _ = std::io::stdout().flush();
        }
    }
}

impl Logger {
    fn with_mode(mode: LoggerMode, file_writer: Option<LogFileWriter>) -> Self {
        Logger {
            mode: Arc::new(Mutex::new(mode)),
            file_writer: Arc::new(Mutex::new(file_writer)),
            min_level: Arc::new(Mutex::new(Severity::Info)),
        }
    }

    pub fn new_standalone() -> Self {
        Self::with_mode(LoggerMode::Standalone, None)
    }

    pub fn new_embedded(sender: Sender<LogMessage>) -> Self {
        Self::with_mode(LoggerMode::Embedded(sender), None)
    }

    pub fn new_file() -> Self {
        Self::with_mode(LoggerMode::File, open_file_writer())
    }

    pub fn new_silent() -> Self {
        Self::with_mode(LoggerMode::Silent, None)
    }

    pub fn set_embedded_mode(&self, sender: Sender<LogMessage>) {
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::Embedded(sender);
        }
    }

    pub fn set_standalone_mode(&self) {
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::Standalone;
        }
    }

    pub fn set_silent_mode(&self) {
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::Silent;
        }
    }

    pub fn set_file_mode(&self) {
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::File;
        }
        self.ensure_file_writer();
    }

    /// Switch to full mode (file + terminal)
    pub fn set_full_mode(&self) {
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::Full;
        }
        self.ensure_file_writer();
    }

    fn ensure_file_writer(&self) {
        if let Ok(mut file_writer) = self.file_writer.lock() {
            if file_writer.is_none() {
                *file_writer = open_file_writer();
            }
        }
    }

    /// Messages less severe than `level` are dropped.
    pub fn set_level(&self, level: Severity) {
        if let Ok(mut min) = self.min_level.lock() {
            *min = level;
        }
    }

    pub fn level(&self) -> Severity {
        self.min_level
            .lock()
            .map(|l| *l)
            .unwrap_or(Severity::Info)
    }

    pub fn log_file_path(&self) -> Option<PathBuf> {
        match self.file_writer.lock() {
            Ok(file_writer) => file_writer.as_ref().map(|w| w.log_file_path()),
            Err(_) => None,
        }
    }

    pub fn log(&self, level: Severity, msg: String) {
        if level > self.level() {
            return;
        }
        let log_msg = LogMessage::new(level, msg);

        let write_to_file = |log_msg: &LogMessage| {
            if let Ok(mut file_writer) = self.file_writer.lock() {
                if let Some(writer) = file_writer.as_mut() {
                    if let Err(e) = writer.write_log(log_msg) {
                        eprintln!("Failed to write to log file: {}", e);
                    }
                }
            }
        };

        if let Ok(mode) = self.mode.lock() {
            match &*mode {
                LoggerMode::Standalone => write_to_terminal(&log_msg),
                LoggerMode::Embedded(sender) => {
                    if sender.try_send(log_msg.clone()).is_err() {
                        eprintln!("Logger channel error: {}", log_msg);
                    }
                }
                LoggerMode::File => write_to_file(&log_msg),
                LoggerMode::Full => {
                    write_to_file(&log_msg);
                    write_to_terminal(&log_msg);
                }
                LoggerMode::Silent => {}
            }
        }
    }

    pub fn debug(&self, msg: String) {
        self.log(Severity::Debug, msg);
    }

    pub fn info(&self, msg: String) {
        self.log(Severity::Info, msg);
    }

    pub fn warn(&self, msg: String) {
        self.log(Severity::Warn, msg);
    }

    pub fn error(&self, msg: String) {
        self.log(Severity::Error, msg);
    }

    pub fn fatal(&self, msg: String) {
        self.log(Severity::Fatal, msg);
    }
}

pub fn init_standalone() {
    let _ = GLOBAL_LOGGER.set(Logger::new_standalone());
}

pub fn init_embedded(sender: Sender<LogMessage>) {
    let _ = GLOBAL_LOGGER.set(Logger::new_embedded(sender));
}

pub fn init_file() {
    let _ = GLOBAL_LOGGER.set(Logger::new_file());
}

/// Create a logging channel pair
pub fn create_log_channel() -> (Sender<LogMessage>, Receiver<LogMessage>) {
    unbounded()
}

/// Get the global logger instance
pub fn get_logger() -> &'static Logger {
    GLOBAL_LOGGER.get_or_init(Logger::new_standalone)
}

pub fn set_embedded_mode(sender: Sender<LogMessage>) {
    get_logger().set_embedded_mode(sender);
}

pub fn set_standalone_mode() {
    get_logger().set_standalone_mode();
}

pub fn set_file_mode() {
    get_logger().set_file_mode();
}

pub fn set_full_mode() {
    get_logger().set_full_mode();
}

pub fn set_silent_mode() {
    get_logger().set_silent_mode();
}

pub fn set_level(level: Severity) {
    get_logger().set_level(level);
}

pub fn get_log_file_path() -> Option<PathBuf> {
    get_logger().log_file_path()
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().debug(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().warn(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().error(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().fatal(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_logger_forwards_messages() {
        let (tx, rx) = create_log_channel();
        let logger = Logger::new_embedded(tx);
        logger.warn("euc: expected number".to_string());
        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.level, Severity::Warn);
        assert_eq!(msg.to_string(), "[WARN] euc: expected number");
    }

    #[test]
    fn level_filter_drops_verbose_messages() {
        let (tx, rx) = create_log_channel();
        let logger = Logger::new_embedded(tx);
        logger.set_level(Severity::Warn);
        logger.debug("hidden".to_string());
        logger.info("hidden".to_string());
        logger.error("shown".to_string());
        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].msg, "shown");
    }

    #[test]
    fn severity_parses_config_names() {
        assert_eq!("debug".parse::<Severity>(), Ok(Severity::Debug));
        assert_eq!("WARNING".parse::<Severity>(), Ok(Severity::Warn));
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn file_writer_rotates_when_full() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = LogFileWriter::in_dir(dir.path().to_path_buf()).unwrap();
        let big = LogMessage::new(Severity::Info, "x".repeat(600 * 1024));
        writer.write_log(&big).unwrap();
        writer.write_log(&big).unwrap();
        assert!(dir.path().join("bog.log").exists());
        assert!(dir.path().join("bog.log.1").exists());
    }
}
