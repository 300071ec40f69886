//! Simulation script steps.

use crate::error::CliError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Open(String),
    Close(String),
    /// Close with forced destruction
    Destroy(String),
    Prewarm(String, usize),
}

impl fmt::Display for ScriptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStep::Open(id) => write!(f, "open {}", id),
            ScriptStep::Close(id) => write!(f, "close {}", id),
            ScriptStep::Destroy(id) => write!(f, "destroy {}", id),
            ScriptStep::Prewarm(id, count) => write!(f, "prewarm {} {}", id, count),
        }
    }
}

/// Parse `"open shop; close shop\nprewarm bag 3"` into steps.
pub fn parse_script(script: &str) -> Result<Vec<ScriptStep>, CliError> {
    script
        .split([';', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_step)
        .collect()
}

fn parse_step(line: &str) -> Result<ScriptStep, CliError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["open", id] => Ok(ScriptStep::Open(id.to_string())),
        ["close", id] => Ok(ScriptStep::Close(id.to_string())),
        ["destroy", id] => Ok(ScriptStep::Destroy(id.to_string())),
        ["prewarm", id, count] => count
            .parse()
            .map(|count| ScriptStep::Prewarm(id.to_string(), count))
            .map_err(|_| CliError::Script(format!("'{}': count must be a number", line))),
        _ => Err(CliError::Script(format!("unrecognised step '{}'", line))),
    }
}
