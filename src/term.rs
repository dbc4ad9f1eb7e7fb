use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Interned name shared by every term that mentions it.
pub type Symbol = Rc<str>;

/// Operator of a deferred arithmetic node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn from_symbol(sym: &str) -> Option<Self> {
        match sym {
            "+" => Some(ArithOp::Add),
            "-" => Some(ArithOp::Sub),
            "*" => Some(ArithOp::Mul),
            "/" => Some(ArithOp::Div),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }

    /// Division by zero yields 0.
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            ArithOp::Add => left + right,
            ArithOp::Sub => left - right,
            ArithOp::Mul => left * right,
            ArithOp::Div => {
                if right != 0.0 {
                    left / right
                } else {
                    0.0
                }
            }
        }
    }
}

/// A Bog value. Terms are immutable; children are shared, so `clone` is cheap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    Number(f64),
    Atom(Symbol),
    /// Holds the source name (or a renamed `Name$n`), used as the binding key.
    Var(Symbol),
    Compound(Symbol, Rc<[Term]>),
    /// Items plus an optional tail; `None` is a proper list.
    List(Rc<[Term]>, Option<Rc<Term>>),
    Expr(ArithOp, Rc<Term>, Rc<Term>),
}

impl Term {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Term::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&Symbol> {
        match self {
            Term::Var(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    /// Functor name and arity of a callable term. Atoms are zero-arity callables.
    pub fn functor(&self) -> Option<(&str, usize)> {
        match self {
            Term::Atom(name) => Some((name, 0)),
            Term::Compound(name, args) => Some((name, args.len())),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Term] {
        match self {
            Term::Compound(_, args) => args,
            _ => &[],
        }
    }

    /// Items of a proper list.
    pub fn as_proper_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(items, None) => Some(items),
            _ => None,
        }
    }

    /// True when no variable occurs anywhere inside the term.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Number(_) | Term::Atom(_) => true,
            Term::Var(_) => false,
            Term::Compound(_, args) => args.iter().all(Term::is_ground),
            Term::List(items, tail) => {
                items.iter().all(Term::is_ground) && tail.as_ref().is_none_or(|t| t.is_ground())
            }
            Term::Expr(_, l, r) => l.is_ground() && r.is_ground(),
        }
    }

    /// Distinct variable names in first-occurrence order.
    pub fn variables(&self, out: &mut Vec<Symbol>) {
        match self {
            Term::Number(_) | Term::Atom(_) => {}
            Term::Var(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Term::Compound(_, args) => args.iter().for_each(|a| a.variables(out)),
            Term::List(items, tail) => {
                items.iter().for_each(|i| i.variables(out));
                if let Some(t) = tail {
                    t.variables(out);
                }
            }
            Term::Expr(_, l, r) => {
                l.variables(out);
                r.variables(out);
            }
        }
    }

    /// Numeric value of a ground number or arithmetic expression.
    pub fn eval_numeric(&self) -> Option<f64> {
        match self {
            Term::Number(n) => Some(*n),
            Term::Expr(op, l, r) => Some(op.apply(l.eval_numeric()?, r.eval_numeric()?)),
            _ => None,
        }
    }
}

/// Renders numbers the way the source text writes them: `60`, `0.25`, `-3`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Term]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Number(n) => write!(f, "{}", format_number(*n)),
            Term::Atom(name) | Term::Var(name) => write!(f, "{}", name),
            Term::Compound(name, args) => {
                write!(f, "{}(", name)?;
                write_seq(f, args)?;
                write!(f, ")")
            }
            Term::List(items, tail) => {
                write!(f, "[")?;
                write_seq(f, items)?;
                if let Some(tail) = tail {
                    if items.is_empty() {
                        write!(f, "| {}", tail)?;
                    } else {
                        write!(f, " | {}", tail)?;
                    }
                }
                write!(f, "]")
            }
            Term::Expr(op, l, r) => write!(f, "({} {} {})", l, op.symbol(), r),
        }
    }
}
