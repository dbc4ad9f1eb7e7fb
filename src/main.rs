use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use std::{fs, io, thread};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use crossbeam_channel::{RecvTimeoutError, unbounded};
use rand::SeedableRng;
use rand::rngs::StdRng;

use bog::builtins::Builtins;
use bog::config::BogConfig;
use bog::resolve::{Context, Resolver};
use bog::schedule::backend::LogBackend;
use bog::session::{Command, Reply, Session};
use bog::term::Symbol;
use bog::unify::subst;
use bog::{Arena, Env, Goal, log_error, log_info, logger, parse, parse_query};

pub const GREETER: &str = "bog: logic programming for rhythm and melody";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Bog: a live coding language where patterns are Prolog-style clauses.",
    long_about = "Bog samples `event(Voice, Pitch, Vel, T)` on a beat grid and plays every \
    solution. Edits take effect on the next bar."
)]
struct Cli {
    /// Configuration file (default: <config dir>/bog/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write logs to the rotating log file
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a file and list its clauses
    Check {
        file: PathBuf,
        /// Dump the parsed program as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print every solution of a goal against a file
    Query { file: PathBuf, goal: String },
    /// Play a file, reloading it when it changes on disk
    Play {
        file: PathBuf,
        #[arg(long)]
        bpm: Option<f64>,
        #[arg(long)]
        swing: Option<f64>,
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<f64>,
    },
    /// Interactive session
    Repl { file: Option<PathBuf> },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => BogConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => BogConfig::load_default().context("loading default config")?,
    };

    logger::set_level(config.log.level);
    if cli.log_file || config.log.file {
        logger::set_full_mode();
    }

    match cli.command {
        Commands::Check { file, json } => check(&file, json),
        Commands::Query { file, goal } => query(&config, &file, &goal),
        Commands::Play { file, bpm, swing, seconds } => {
            let mut config = config;
            if let Some(bpm) = bpm {
                config.scheduler.bpm = bpm;
            }
            if let Some(swing) = swing {
                config.scheduler.swing = swing;
            }
            config.validate()?;
            play(&config, &file, seconds)
        }
        Commands::Repl { file } => repl(&config, file.as_deref()),
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn check(file: &Path, json: bool) -> Result<()> {
    let source = read_source(file)?;
    let program = match parse(&source) {
        Ok(program) => program,
        Err(e) => bail!("{}: {}", file.display(), e),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&program)?);
        return Ok(());
    }
    for clause in program.iter() {
        println!("{}", clause);
    }
    let predicates: Vec<String> = program
        .predicates()
        .into_iter()
        .map(|(name, arity)| format!("{}/{}", name, arity))
        .collect();
    println!("% {} clauses: {}", program.len(), predicates.join(", "));
    Ok(())
}

fn query_variables(branches: &[Vec<Goal>]) -> Vec<Symbol> {
    let mut vars = Vec::new();
    for goal in branches.iter().flatten() {
        if let Goal::Term(term) = goal {
            term.variables(&mut vars);
        }
    }
    vars.retain(|v| !v.starts_with('_'));
    vars
}

fn query(config: &BogConfig, file: &Path, goal: &str) -> Result<()> {
    let source = read_source(file)?;
    let program = parse(&source).map_err(|e| anyhow::anyhow!("{}: {}", file.display(), e))?;
    let branches = parse_query(goal).map_err(|e| anyhow::anyhow!("query: {}", e))?;
    let vars = query_variables(&branches);

    let builtins = Builtins::standard();
    let mut state = bog::StateManager::new();
    let mut rng = match config.engine.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut ctx = Context::new(config.scheduler.bpm, &mut state, &mut rng);
    let mut resolver = Resolver::new(&program, &builtins).with_max_depth(config.engine.max_depth);
    let arena = Arena::new();

    let mut found = 0;
    for goals in &branches {
        for env in resolver.solve(goals, Env::new(), &mut ctx) {
            found += 1;
            if vars.is_empty() {
                println!("true");
                continue;
            }
            let bindings: Vec<String> = vars
                .iter()
                .map(|v| format!("{} = {}", v, subst(&arena.var(v), &env, &arena)))
                .collect();
            println!("{}", bindings.join(", "));
        }
    }
    if found == 0 {
        println!("false");
    }
    Ok(())
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn play(config: &BogConfig, file: &Path, seconds: Option<f64>) -> Result<()> {
    let scheduler = config.scheduler(LogBackend::new());
    let mut session = Session::new(scheduler, config.transition_manager());
    session.load_file(file)?;
    let mut stamp = modified(file);
    let tick = Duration::from_millis(config.scheduler.tick_ms);
    let started = Instant::now();
    log_info!("playing {} (ctrl-c to stop)", file.display());

    loop {
        if seconds.is_some_and(|limit| started.elapsed().as_secs_f64() >= limit) {
            break;
        }
        let current = modified(file);
        if current != stamp {
            stamp = current;
            match session.load_file(file) {
                Ok(install) => log_info!("reloaded {}: {}", file.display(), Reply::Installed(install)),
                Err(e) => log_error!("{}", e),
            }
        }
        session.tick();
        thread::sleep(tick);
    }
    session.scheduler_mut().stop();
    Ok(())
}

fn prompt() {
    print!("bog> ");
    let _ = io::stdout().flush();
}

fn repl(config: &BogConfig, file: Option<&Path>) -> Result<()> {
    let scheduler = config.scheduler(LogBackend::new());
    let mut session = Session::new(scheduler, config.transition_manager());
    println!("{} ({})", GREETER, env!("CARGO_PKG_VERSION"));
    println!("type :help for commands");
    if let Some(path) = file {
        match session.load_file(path) {
            Ok(install) => println!("{}", Reply::Installed(install)),
            Err(e) => println!("error: {}", e),
        }
    }

    let (tx, rx) = unbounded::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let tick = Duration::from_millis(config.scheduler.tick_ms);
    prompt();
    loop {
        match rx.recv_timeout(tick) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let reply = Command::parse(&line)
                        .map_err(anyhow::Error::from)
                        .and_then(|cmd| session.execute(cmd).map_err(anyhow::Error::from));
                    match reply {
                        Ok(Reply::Quit) => {
                            println!("{}", Reply::Quit);
                            break;
                        }
                        Ok(reply) => println!("{}", reply),
                        Err(e) => println!("error: {}", e),
                    }
                }
                prompt();
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        session.tick();
    }
    session.scheduler_mut().stop();
    Ok(())
}
