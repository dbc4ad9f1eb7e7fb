use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::arena::Arena;
use crate::builtins::Builtins;
use crate::env::Env;
use crate::parser::{parse, parse_query};
use crate::program::Program;
use crate::resolve::{Context, DEFAULT_MAX_DEPTH, Resolver};
use crate::state::StateManager;
use crate::unify::subst;

/// A program plus the state a scheduler would carry, for driving queries in tests.
pub struct Harness {
    pub program: Program,
    pub builtins: Builtins,
    pub state: StateManager,
    pub rng: StdRng,
    pub bpm: f64,
    pub max_depth: usize,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_program("")
    }

    pub fn with_program(source: &str) -> Self {
        let program = match parse(source) {
            Ok(p) => p,
            Err(e) => panic!("test program failed to parse: {}", e),
        };
        Harness {
            program,
            builtins: Builtins::standard(),
            state: StateManager::new(),
            rng: StdRng::seed_from_u64(7),
            bpm: 120.0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn solve(&mut self, query: &str) -> Vec<Env> {
        let branches = match parse_query(query) {
            Ok(b) => b,
            Err(e) => panic!("query {} failed to parse: {}", query, e),
        };
        let mut ctx = Context::new(self.bpm, &mut self.state, &mut self.rng);
        let mut resolver = Resolver::new(&self.program, &self.builtins).with_max_depth(self.max_depth);
        let mut out = Vec::new();
        for goals in &branches {
            out.extend(resolver.solve(goals, Env::new(), &mut ctx));
        }
        out
    }

    /// Rendered value of `var` in each solution.
    pub fn values(&mut self, query: &str, var: &str) -> Vec<String> {
        let arena = Arena::new();
        let target = arena.var(var);
        self.solve(query)
            .iter()
            .map(|env| subst(&target, env, &arena).to_string())
            .collect()
    }

    pub fn count(&mut self, query: &str) -> usize {
        self.solve(query).len()
    }

    pub fn succeeds(&mut self, query: &str) -> bool {
        self.count(query) > 0
    }
}
