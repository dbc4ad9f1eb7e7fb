//! Re-evaluation of edited source while a program is playing.

use std::rc::Rc;

use crate::callbacks::{CallbackHandle, CallbackRegistry};
use crate::parser::{ParseError, parse};
use crate::program::Program;
use crate::{log_info, log_warn};

/// Outcome of one evaluation, as seen by subscribers.
#[derive(Debug, Clone, Copy)]
pub struct ValidationEvent<'a> {
    pub success: bool,
    pub program: Option<&'a Program>,
    pub text: &'a str,
    pub error: Option<&'a ParseError>,
}

pub type ValidationCallback = dyn FnMut(&ValidationEvent<'_>);

/// Trims `text` and appends the final `.` a REPL line usually omits.
fn normalize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.ends_with('.') {
        trimmed.to_string()
    } else {
        format!("{}.", trimmed)
    }
}

/// Parses `text` as it would be evaluated. Blank text is an empty program.
pub fn validate_code(text: &str) -> Result<Program, ParseError> {
    let code = normalize(text);
    if code.is_empty() {
        return Ok(Program::default());
    }
    parse(&code)
}

/// Keeps the last program that parsed. A failed evaluation never replaces it.
#[derive(Default)]
pub struct LiveEvaluator {
    last_code: String,
    program: Option<Rc<Program>>,
    callbacks: CallbackRegistry<ValidationCallback>,
}

impl LiveEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&mut self, text: &str) -> Result<Rc<Program>, ParseError> {
        let code = normalize(text);
        match validate_code(&code) {
            Ok(program) => {
                let program = Rc::new(program);
                log_info!("live: accepted {} clauses", program.len());
                self.last_code = code.clone();
                self.program = Some(Rc::clone(&program));
                self.notify(&ValidationEvent {
                    success: true,
                    program: Some(&program),
                    text: &code,
                    error: None,
                });
                Ok(program)
            }
            Err(e) => {
                log_warn!("live: {}", e);
                self.notify(&ValidationEvent {
                    success: false,
                    program: None,
                    text: &code,
                    error: Some(&e),
                });
                Err(e)
            }
        }
    }

    /// Source of the last successful evaluation.
    pub fn last_code(&self) -> &str {
        &self.last_code
    }

    pub fn program(&self) -> Option<&Rc<Program>> {
        self.program.as_ref()
    }

    pub fn on_validated(&mut self, callback: Box<ValidationCallback>) -> CallbackHandle {
        self.callbacks.add(callback)
    }

    pub fn remove_callback(&mut self, handle: CallbackHandle) -> bool {
        self.callbacks.remove(handle)
    }

    fn notify(&mut self, event: &ValidationEvent<'_>) {
        for callback in self.callbacks.iter_mut() {
            callback(event);
        }
    }
}
