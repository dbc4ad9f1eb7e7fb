use std::{error, fmt};

use serde::{Deserialize, Serialize};

/// The single error reported by a failed parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    /// Human readable description.
    pub info: String,
    /// 1-based line of the offending token.
    pub line: usize,
    /// 1-based column of the offending token.
    pub column: usize,
}

impl ParseError {
    pub fn new(info: impl Into<String>, line: usize, column: usize) -> Self {
        ParseError {
            info: info.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}:{}: {}", self.line, self.column, self.info)
    }
}

impl error::Error for ParseError {}
