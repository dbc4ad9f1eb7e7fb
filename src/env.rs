use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::term::{Symbol, Term};

struct Binding {
    name: Symbol,
    value: Term,
    next: Option<Rc<Binding>>,
}

/// Substitution environment.
///
/// A persistent list of `(name, value)` bindings, newest first. Cloning shares
/// the whole list, so every search branch can own its own `Env` for the cost
/// of a pointer copy. Bindings are never removed.
#[derive(Clone, Default)]
pub struct Env {
    head: Option<Rc<Binding>>,
    len: usize,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        let mut cur = self.head.as_deref();
        while let Some(binding) = cur {
            if &*binding.name == name {
                return Some(&binding.value);
            }
            cur = binding.next.as_deref();
        }
        None
    }

    pub fn bind(&mut self, name: Symbol, value: Term) {
        let next = self.head.take();
        self.head = Some(Rc::new(Binding { name, value, next }));
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bindings in insertion order, one per name.
    pub fn bindings(&self) -> Vec<(Symbol, Term)> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(self.len);
        let mut cur = self.head.as_deref();
        while let Some(binding) = cur {
            if seen.insert(binding.name.clone()) {
                out.push((binding.name.clone(), binding.value.clone()));
            }
            cur = binding.next.as_deref();
        }
        out.reverse();
        out
    }
}

impl Drop for Env {
    // Unlinks iteratively so long binding chains cannot exhaust the stack.
    fn drop(&mut self) {
        let mut cur = self.head.take();
        while let Some(node) = cur {
            match Rc::try_unwrap(node) {
                Ok(mut binding) => cur = binding.next.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.bindings().iter().map(|(k, v)| (k.to_string(), v.to_string())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_do_not_see_later_bindings() {
        let mut env = Env::new();
        env.bind(Rc::from("X"), Term::Number(1.0));
        let snapshot = env.clone();
        env.bind(Rc::from("Y"), Term::Number(2.0));
        assert!(snapshot.get("Y").is_none());
        assert_eq!(env.get("Y"), Some(&Term::Number(2.0)));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn bindings_keep_insertion_order() {
        let mut env = Env::new();
        env.bind(Rc::from("B"), Term::Number(1.0));
        env.bind(Rc::from("A"), Term::Number(2.0));
        let names: Vec<_> = env.bindings().into_iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn long_chains_drop_cleanly() {
        let mut env = Env::new();
        for i in 0..200_000 {
            env.bind(Rc::from(format!("V{}", i)), Term::Number(i as f64));
        }
        drop(env);
    }
}
