//! Allocation scope for terms.
//!
//! Every term built while parsing one program or answering one query goes
//! through an `Arena`. Terms share structure through `Rc`, so nothing is ever
//! freed individually; the arena interns names so repeated atoms and variables
//! point at one allocation, and it keeps counts for diagnostics.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::term::{ArithOp, Symbol, Term};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Terms constructed through this arena.
    pub terms: usize,
    /// Distinct interned names.
    pub symbols: usize,
}

#[derive(Debug, Default)]
pub struct Arena {
    symbols: RefCell<HashSet<Symbol>>,
    terms: Cell<usize>,
}

impl Arena {
    pub fn new() -> Self {
        Arena::default()
    }

    pub fn intern(&self, name: &str) -> Symbol {
        let mut symbols = self.symbols.borrow_mut();
        if let Some(existing) = symbols.get(name) {
            return existing.clone();
        }
        let sym: Symbol = Rc::from(name);
        symbols.insert(sym.clone());
        sym
    }

    fn count(&self) {
        self.terms.set(self.terms.get() + 1);
    }

    pub fn num(&self, value: f64) -> Term {
        self.count();
        Term::Number(value)
    }

    pub fn atom(&self, name: &str) -> Term {
        self.count();
        Term::Atom(self.intern(name))
    }

    pub fn var(&self, name: &str) -> Term {
        self.count();
        Term::Var(self.intern(name))
    }

    pub fn compound(&self, functor: &str, args: Vec<Term>) -> Term {
        self.count();
        Term::Compound(self.intern(functor), Rc::from(args))
    }

    pub fn list(&self, items: Vec<Term>, tail: Option<Term>) -> Term {
        self.count();
        Term::List(Rc::from(items), tail.map(Rc::new))
    }

    pub fn expr(&self, op: ArithOp, left: Term, right: Term) -> Term {
        self.count();
        Term::Expr(op, Rc::new(left), Rc::new(right))
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            terms: self.terms.get(),
            symbols: self.symbols.borrow().len(),
        }
    }
}
