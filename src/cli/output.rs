//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{CliError, ConfigError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &CliError) -> String {
    match e {
        CliError::Config(ConfigError::Invalid(details)) => {
            format!("Configuration is invalid:\n{}", details)
        }
        other => other.to_string(),
    }
}
