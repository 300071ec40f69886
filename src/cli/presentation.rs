//! CLI presentation: text formatters per command.

use crate::cli::route::{CheckReport, SimulationReport};
use crate::workflow::ViewState;
use comfy_table::{presets, Table};
use owo_colors::OwoColorize;

fn section_title(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_header(header);
    table
}

fn state_label(state: ViewState) -> String {
    match state {
        ViewState::Open => state.green().to_string(),
        ViewState::Cached => state.yellow().to_string(),
        ViewState::Opening | ViewState::Closing => state.cyan().to_string(),
        ViewState::Absent => state.dimmed().to_string(),
    }
}

pub fn format_check_text(report: &CheckReport) -> String {
    let mut layers = table(vec!["Layer", "Z-Index"]);
    for row in &report.layers {
        layers.add_row(vec![row.layer.to_string(), row.z_index.to_string()]);
    }

    let mut sections = vec![
        format!("Configuration: {}", report.source),
        String::new(),
        section_title("Layers"),
        layers.to_string(),
    ];

    sections.push(String::new());
    sections.push(section_title("Views"));
    if report.views.is_empty() {
        sections.push("No views registered.".to_string());
    } else {
        let mut views = table(vec!["Id", "Template", "Layer", "Priority", "Cache on close"]);
        for view in &report.views {
            views.add_row(vec![
                view.id.clone(),
                view.template_path.clone(),
                view.layer.to_string(),
                view.priority.to_string(),
                if view.cache_on_close { "yes" } else { "no" }.to_string(),
            ]);
        }
        sections.push(views.to_string());
    }

    sections.push(String::new());
    sections.push(format!(
        "Pool cap: {}  Template cache: {}",
        report.max_pool_size,
        if report.cache_templates { "on" } else { "off" }
    ));
    sections.push(format!("{}", "Configuration is valid".green()));
    sections.join("\n")
}

pub fn format_simulation_text(report: &SimulationReport) -> String {
    let mut steps = table(vec!["#", "Step", "Result"]);
    for (index, step) in report.steps.iter().enumerate() {
        let result = if step.ok {
            format!("{} {}", "ok".green(), step.detail)
        } else {
            format!("{} {}", "failed".red(), step.detail)
        };
        steps.add_row(vec![(index + 1).to_string(), step.step.clone(), result]);
    }

    let mut views = table(vec!["Id", "Layer", "State", "Priority"]);
    for row in &report.views {
        views.add_row(vec![
            row.id.clone(),
            row.layer.to_string(),
            state_label(row.state),
            row.priority.to_string(),
        ]);
    }

    let mut requests = table(vec!["Template", "Loads"]);
    for (path, count) in &report.requests {
        requests.add_row(vec![path.clone(), count.to_string()]);
    }

    let mut out = vec![
        section_title("Steps"),
        steps.to_string(),
        String::new(),
        section_title("Views"),
        views.to_string(),
        String::new(),
        section_title("Template loads"),
        requests.to_string(),
        String::new(),
        format!(
            "Pool: {} created, {} reused, {} destroyed",
            report.pool.created, report.pool.reused, report.pool.destroyed
        ),
    ];

    if !report.events.is_empty() {
        out.push(String::new());
        out.push(section_title("Events"));
        out.extend(report.events.iter().map(|event| format!("  {}", event)));
    }
    out.join("\n")
}
