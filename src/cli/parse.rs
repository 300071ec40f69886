//! CLI parse: clap types for viewdeck. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// viewdeck CLI - layered view lifecycle orchestrator
#[derive(Parser)]
#[command(name = "viewdeck")]
#[command(about = "Inspect and simulate layered view lifecycles")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root (config/viewdeck.toml is read from here)
    #[arg(long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate the runtime configuration
    Check {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Run an open/close script against an in-memory runtime
    Simulate {
        /// Steps separated by ';' or newlines: "open ID", "close ID",
        /// "destroy ID", "prewarm ID COUNT"
        #[arg(long)]
        script: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the effective configuration (all sources merged) as TOML
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Commands {
    /// Command name for logs (e.g. "check", "simulate").
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Check { .. } => "check",
            Commands::Simulate { .. } => "simulate",
            Commands::Config => "config",
        }
    }
}
