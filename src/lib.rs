pub mod arena;
pub mod builtins;
pub mod callbacks;
pub mod config;
pub mod env;
pub mod live;
pub mod logger;
pub mod parser;
pub mod program;
pub mod resolve;
pub mod schedule;
pub mod session;
pub mod state;
pub mod term;
pub mod unify;

#[cfg(test)]
pub(crate) mod testing;

pub use arena::Arena;
pub use env::Env;
pub use parser::{ParseError, parse, parse_query};
pub use program::{Clause, Goal, GoalList, Program};
pub use resolve::{Resolver, Solutions};
pub use schedule::Scheduler;
pub use schedule::transition::TransitionManager;
pub use state::StateManager;
pub use term::Term;
