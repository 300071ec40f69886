//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the runtime.

mod output;
mod parse;
mod presentation;
mod route;
mod script;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_check_text, format_simulation_text};
pub use route::{CheckReport, LayerRow, RunContext, SimulationReport, StepReport};
pub use script::{parse_script, ScriptStep};
