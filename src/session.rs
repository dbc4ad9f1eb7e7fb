//! Host glue: evaluated source flows through the live evaluator and the
//! transition manager into the scheduler. The REPL and `bog play` drive a
//! [`Session`] from their tick loop.

use std::path::{Path, PathBuf};
use std::{error, fmt, fs, io};

use crate::live::LiveEvaluator;
use crate::log_info;
use crate::parser::ParseError;
use crate::schedule::backend::{AudioBackend, NullBackend};
use crate::schedule::transition::TransitionManager;
use crate::schedule::Scheduler;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 400.0;

pub const HELP: &str = "\
Commands:
  :help, :h, :?     Show this help
  :tempo BPM        Set tempo (20-400)
  :swing AMOUNT     Set swing (0.0-1.0)
  :play FILE        Load and evaluate a Bog file
  :stop             Stop the transport
  :start            Start the transport
  :status           Show transport state
  :quit, :q         Leave the REPL

Anything else is evaluated as Bog source, e.g.
  event(kick, 36, 0.9, T) :- every(T, 1).
  event(hat, 42, 0.5, T) :- every(T, 0.25).
  event(sine, N, 0.6, T) :- every(T, 2), scale(60, dorian, 3, 0, N).

Voices: kick snare hat clap noise (drums), sine square triangle (melodic)";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Tempo(f64),
    Swing(f64),
    Play(PathBuf),
    Stop,
    Start,
    Status,
    Quit,
    Source(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    MissingArgument(&'static str),
    InvalidNumber(String),
    OutOfRange { what: &'static str, value: f64, min: f64, max: f64 },
    Unknown(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::MissingArgument(cmd) => write!(f, ":{} needs an argument", cmd),
            CommandError::InvalidNumber(text) => write!(f, "'{}' is not a number", text),
            CommandError::OutOfRange { what, value, min, max } => {
                write!(f, "{} {} out of range ({}-{})", what, value, min, max)
            }
            CommandError::Unknown(cmd) => write!(f, "unknown command '{}' (try :help)", cmd),
        }
    }
}

impl error::Error for CommandError {}

fn ranged(arg: Option<&str>, cmd: &'static str, min: f64, max: f64) -> Result<f64, CommandError> {
    let text = arg.ok_or(CommandError::MissingArgument(cmd))?;
    let value: f64 = text
        .parse()
        .map_err(|_| CommandError::InvalidNumber(text.to_string()))?;
    if !(min..=max).contains(&value) {
        return Err(CommandError::OutOfRange { what: cmd, value, min, max });
    }
    Ok(value)
}

impl Command {
    /// Lines starting with `:` are commands; anything else is source.
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix(':') else {
            return Ok(Command::Source(line.to_string()));
        };
        let rest = rest.trim_start();
        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or("");
        let arg = words.next();
        match name {
            "help" | "h" | "?" => Ok(Command::Help),
            "tempo" => ranged(arg, "tempo", MIN_BPM, MAX_BPM).map(Command::Tempo),
            "swing" => ranged(arg, "swing", 0.0, 1.0).map(Command::Swing),
            "play" => {
                let path = rest["play".len()..].trim();
                if path.is_empty() {
                    Err(CommandError::MissingArgument("play"))
                } else {
                    Ok(Command::Play(PathBuf::from(path)))
                }
            }
            "stop" => Ok(Command::Stop),
            "start" => Ok(Command::Start),
            "status" => Ok(Command::Status),
            "quit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(format!(":{}", other))),
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    Parse(ParseError),
    Io(PathBuf, io::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Parse(e) => write!(f, "{}", e),
            SessionError::Io(path, e) => write!(f, "cannot read {}: {}", path.display(), e),
        }
    }
}

impl error::Error for SessionError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SessionError::Parse(e) => Some(e),
            SessionError::Io(_, e) => Some(e),
        }
    }
}

impl From<ParseError> for SessionError {
    fn from(e: ParseError) -> Self {
        SessionError::Parse(e)
    }
}

/// When an accepted program takes over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Install {
    Immediate,
    AtBoundary(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub running: bool,
    pub bpm: f64,
    pub swing: f64,
    pub beat: i64,
    pub clauses: usize,
    pub pending_boundary: Option<f64>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transport = if self.running { "running" } else { "stopped" };
        write!(
            f,
            "{} | {} bpm | swing {} | beat {} | {} clauses",
            transport, self.bpm, self.swing, self.beat, self.clauses
        )?;
        if let Some(at) = self.pending_boundary {
            write!(f, " | next program at {:.3}s", at)?;
        }
        Ok(())
    }
}

/// What a command did, for the REPL to print.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Help,
    Installed(Install),
    Tempo(f64),
    Swing(f64),
    Started,
    Stopped,
    Status(Status),
    Quit,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Help => f.write_str(HELP),
            Reply::Installed(Install::Immediate) => f.write_str("ok"),
            Reply::Installed(Install::AtBoundary(at)) => write!(f, "ok, playing from {:.3}s", at),
            Reply::Tempo(bpm) => write!(f, "tempo {} bpm", bpm),
            Reply::Swing(amount) => write!(f, "swing {}", amount),
            Reply::Started => f.write_str("started"),
            Reply::Stopped => f.write_str("stopped"),
            Reply::Status(status) => write!(f, "{}", status),
            Reply::Quit => f.write_str("bye"),
        }
    }
}

pub struct Session<B: AudioBackend = NullBackend> {
    scheduler: Scheduler<B>,
    transitions: TransitionManager,
    evaluator: LiveEvaluator,
}

impl<B: AudioBackend> Session<B> {
    pub fn new(scheduler: Scheduler<B>, transitions: TransitionManager) -> Self {
        Session {
            scheduler,
            transitions,
            evaluator: LiveEvaluator::new(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler<B> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<B> {
        &mut self.scheduler
    }

    pub fn transitions(&self) -> &TransitionManager {
        &self.transitions
    }

    pub fn evaluator(&self) -> &LiveEvaluator {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut LiveEvaluator {
        &mut self.evaluator
    }

    /// Evaluates source. A stopped transport (or one with nothing to play)
    /// takes the program at once and starts; otherwise it waits for the next
    /// quantization boundary. A parse error leaves playback untouched.
    pub fn evaluate(&mut self, text: &str) -> Result<Install, SessionError> {
        let program = self.evaluator.evaluate(text)?;
        if self.scheduler.is_running() && self.scheduler.program().is_some() {
            let now = self.scheduler.now();
            let boundary = self.transitions.schedule(program, now, &self.scheduler);
            return Ok(Install::AtBoundary(boundary));
        }
        self.transitions.cancel();
        self.scheduler.set_program(program);
        if !self.scheduler.is_running() {
            self.scheduler.start();
        }
        Ok(Install::Immediate)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<Install, SessionError> {
        let source = fs::read_to_string(path).map_err(|e| SessionError::Io(path.to_path_buf(), e))?;
        log_info!("session: loading {}", path.display());
        self.evaluate(&source)
    }

    pub fn tick(&mut self) -> usize {
        let now = self.scheduler.now();
        self.tick_at(now)
    }

    /// Applies a due transition, then ticks the scheduler.
    pub fn tick_at(&mut self, now: f64) -> usize {
        self.transitions.process(now, &mut self.scheduler);
        self.scheduler.tick_at(now)
    }

    pub fn status(&self) -> Status {
        Status {
            running: self.scheduler.is_running(),
            bpm: self.scheduler.bpm(),
            swing: self.scheduler.swing(),
            beat: self.scheduler.current_beat(),
            clauses: self.scheduler.program().map_or(0, |p| p.len()),
            pending_boundary: self.transitions.pending_boundary(),
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Reply, SessionError> {
        let reply = match command {
            Command::Help => Reply::Help,
            Command::Tempo(bpm) => {
                self.scheduler.set_bpm(bpm);
                Reply::Tempo(self.scheduler.bpm())
            }
            Command::Swing(amount) => {
                self.scheduler.set_swing(amount);
                Reply::Swing(self.scheduler.swing())
            }
            Command::Play(path) => Reply::Installed(self.load_file(&path)?),
            Command::Stop => {
                self.transitions.cancel();
                self.scheduler.stop();
                Reply::Stopped
            }
            Command::Start => {
                if !self.scheduler.is_running() {
                    self.scheduler.start();
                }
                Reply::Started
            }
            Command::Status => Reply::Status(self.status()),
            Command::Quit => Reply::Quit,
            Command::Source(text) => Reply::Installed(self.evaluate(&text)?),
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::schedule::backend::{RecordingBackend, Voice};

    fn session() -> Session<RecordingBackend> {
        Session::new(Scheduler::new(RecordingBackend::new()).with_seed(3), TransitionManager::new(4.0))
    }

    #[test]
    fn commands_parse() {
        assert_eq!(Command::parse(":h"), Ok(Command::Help));
        assert_eq!(Command::parse(" :? "), Ok(Command::Help));
        assert_eq!(Command::parse(":tempo 90"), Ok(Command::Tempo(90.0)));
        assert_eq!(Command::parse(":swing 0.25"), Ok(Command::Swing(0.25)));
        assert_eq!(Command::parse(":play songs/my beat.bog"), Ok(Command::Play(PathBuf::from("songs/my beat.bog"))));
        assert_eq!(Command::parse(":q"), Ok(Command::Quit));
        assert_eq!(Command::parse("event(kick, 36, 1, T)."), Ok(Command::Source("event(kick, 36, 1, T).".into())));
    }

    #[test]
    fn command_arguments_are_checked() {
        assert_eq!(Command::parse(":tempo"), Err(CommandError::MissingArgument("tempo")));
        assert_eq!(Command::parse(":tempo fast"), Err(CommandError::InvalidNumber("fast".into())));
        assert!(matches!(Command::parse(":tempo 500"), Err(CommandError::OutOfRange { .. })));
        assert!(matches!(Command::parse(":swing 1.5"), Err(CommandError::OutOfRange { .. })));
        assert_eq!(Command::parse(":play"), Err(CommandError::MissingArgument("play")));
        assert_eq!(Command::parse(":dance"), Err(CommandError::Unknown(":dance".into())));
    }

    #[test]
    fn first_program_starts_playback() {
        let mut s = session();
        assert_eq!(s.evaluate("event(kick, 36, 1, T)").unwrap(), Install::Immediate);
        assert!(s.scheduler().is_running());
        assert_eq!(s.tick_at(0.0), 1);
    }

    #[test]
    fn later_programs_wait_for_the_bar() {
        let mut s = session();
        s.evaluate("event(kick, 36, 1, T) :- every(T, 1).").unwrap();
        s.tick_at(0.0);
        s.scheduler_mut().backend_mut().set_time(1.3);
        let install = s.evaluate("event(snare, 38, 1, T) :- every(T, 1).").unwrap();
        assert_eq!(install, Install::AtBoundary(2.0));

        s.tick_at(1.45);
        s.tick_at(1.9);
        s.tick_at(2.0);
        let voices: Vec<(Voice, f64)> = s
            .scheduler_mut()
            .backend_mut()
            .take()
            .into_iter()
            .map(|t| (t.voice, t.time))
            .collect();
        assert_eq!(voices, vec![(Voice::Kick, 0.0), (Voice::Kick, 1.5), (Voice::Snare, 2.0)]);
    }

    #[test]
    fn parse_errors_keep_playing() {
        let mut s = session();
        s.evaluate("event(hat, 42, 1, T).").unwrap();
        let err = s.execute(Command::Source("event(hat,".into())).unwrap_err();
        assert!(matches!(err, SessionError::Parse(_)));
        assert_eq!(s.status().clauses, 1);
        assert!(!s.transitions().has_pending());
    }

    #[test]
    fn transport_commands() {
        let mut s = session();
        assert_eq!(s.execute(Command::Tempo(90.0)).unwrap(), Reply::Tempo(90.0));
        assert_eq!(s.execute(Command::Swing(0.5)).unwrap(), Reply::Swing(0.5));
        assert_eq!(s.execute(Command::Start).unwrap(), Reply::Started);
        assert!(s.scheduler().is_running());
        assert_eq!(s.execute(Command::Stop).unwrap(), Reply::Stopped);
        let Reply::Status(status) = s.execute(Command::Status).unwrap() else {
            panic!("expected a status reply");
        };
        assert!(!status.running);
        assert_eq!(status.bpm, 90.0);
        assert_eq!(status.to_string(), "stopped | 90 bpm | swing 0.5 | beat 0 | 0 clauses");
    }

    #[test]
    fn play_loads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "% groove").unwrap();
        writeln!(file, "event(kick, 36, 0.9, T) :- every(T, 1).").unwrap();
        writeln!(file, "event(hat, 42, 0.5, T) :- every(T, 0.5).").unwrap();

        let mut s = session();
        let reply = s.execute(Command::Play(file.path().to_path_buf())).unwrap();
        assert_eq!(reply, Reply::Installed(Install::Immediate));
        assert_eq!(s.status().clauses, 2);

        let missing = s.execute(Command::Play(PathBuf::from("/definitely/not/here.bog")));
        assert!(matches!(missing, Err(SessionError::Io(..))));
    }
}
