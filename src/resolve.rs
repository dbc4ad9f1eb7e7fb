//! Find-all SLD resolution.
//!
//! Goals are proved left to right. Builtins run once per call and may push any
//! number of environments; user predicates try every clause top to bottom, so
//! a query's solutions are the union over all matching clauses in program order.

use rand::rngs::StdRng;

use crate::arena::Arena;
use crate::builtins::Builtins;
use crate::env::Env;
use crate::program::{Goal, Program};
use crate::state::StateManager;
use crate::term::Term;
use crate::unify::{rename_clause, unify, walk};
use crate::{log_debug, log_warn};

/// Every environment that satisfies a goal list, in discovery order.
pub type Solutions = Vec<Env>;

/// Default bound on nested user predicate calls.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// A goal still to be proved, with the number of user calls it is nested in.
/// Goals that follow each other share a depth; only clause bodies go deeper.
#[derive(Clone)]
struct Pending {
    goal: Goal,
    depth: usize,
}

fn pending(goals: &[Goal], depth: usize) -> Vec<Pending> {
    goals.iter().map(|goal| Pending { goal: goal.clone(), depth }).collect()
}

/// Mutable world visible to builtins during one resolution.
pub struct Context<'a> {
    pub bpm: f64,
    pub state: &'a mut StateManager,
    pub rng: &'a mut StdRng,
}

impl<'a> Context<'a> {
    pub fn new(bpm: f64, state: &'a mut StateManager, rng: &'a mut StdRng) -> Self {
        Context { bpm, state, rng }
    }
}

pub struct Resolver<'p> {
    program: &'p Program,
    builtins: &'p Builtins,
    arena: Arena,
    counter: usize,
    max_depth: usize,
    depth_exceeded: bool,
}

impl<'p> Resolver<'p> {
    pub fn new(program: &'p Program, builtins: &'p Builtins) -> Self {
        Resolver {
            program,
            builtins,
            arena: Arena::new(),
            counter: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            depth_exceeded: false,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Proves `goals` from `env`, returning every solution.
    pub fn solve(&mut self, goals: &[Goal], env: Env, ctx: &mut Context<'_>) -> Solutions {
        self.depth_exceeded = false;
        let mut out = Vec::new();
        self.solve_from(&pending(goals, 0), env, ctx, &mut out);
        out
    }

    fn solve_from(&mut self, goals: &[Pending], env: Env, ctx: &mut Context<'_>, out: &mut Solutions) {
        let Some((first, rest)) = goals.split_first() else {
            out.push(env);
            return;
        };
        match &first.goal {
            Goal::Not(branches) => {
                for branch in branches {
                    let mut proofs = Vec::new();
                    self.solve_from(&pending(branch, first.depth), env.clone(), ctx, &mut proofs);
                    if !proofs.is_empty() {
                        return;
                    }
                }
                self.solve_from(rest, env, ctx, out);
            }
            Goal::Term(term) => self.solve_term(term, first.depth, rest, env, ctx, out),
        }
    }

    fn solve_term(
        &mut self,
        term: &Term,
        depth: usize,
        rest: &[Pending],
        env: Env,
        ctx: &mut Context<'_>,
        out: &mut Solutions,
    ) {
        let callee = walk(term, &env).clone();
        let Some((name, arity)) = callee.functor() else {
            if callee.is_var() {
                log_warn!("goal {} is unbound", term);
            } else {
                log_warn!("{} is not callable", callee);
            }
            return;
        };

        let builtins = self.builtins;
        if let Some(def) = builtins.find(name, arity) {
            let mut produced = Vec::new();
            if let Err(e) = (def.func)(callee.args(), &env, ctx, &mut produced, &self.arena) {
                log_warn!("{}/{}: {}", name, arity, e);
            }
            for next in produced {
                self.solve_from(rest, next, ctx, out);
            }
            return;
        }

        if depth >= self.max_depth {
            if !self.depth_exceeded {
                log_warn!("depth limit {} reached while proving {}; branch pruned", self.max_depth, callee);
                self.depth_exceeded = true;
            }
            return;
        }

        let program = self.program;
        let mut matched = false;
        for clause in program.iter() {
            if clause.head.functor() != Some((name, arity)) {
                continue;
            }
            matched = true;
            let renamed = rename_clause(clause, &mut self.counter, &self.arena);
            let mut trial = env.clone();
            if !unify(&callee, &renamed.head, &mut trial, &self.arena) {
                continue;
            }
            let mut goals = pending(&renamed.body, depth + 1);
            goals.extend_from_slice(rest);
            self.solve_from(&goals, trial, ctx, out);
        }
        if !matched {
            log_debug!("no clauses for {}/{}", name, arity);
        }
    }
}

/// One-shot resolution with a fresh resolver.
pub fn resolve(
    goals: &[Goal],
    env: Env,
    program: &Program,
    ctx: &mut Context<'_>,
    builtins: &Builtins,
) -> Solutions {
    Resolver::new(program, builtins).solve(goals, env, ctx)
}

#[cfg(test)]
mod tests;
