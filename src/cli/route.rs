//! CLI route: single route table and run context. Dispatches to the runtime and presentation.

use crate::animation::{AnimationPort, InstantTween};
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_check_text, format_simulation_text};
use crate::cli::script::{parse_script, ScriptStep};
use crate::config::{ConfigLoader, RuntimeConfig};
use crate::directory::ViewStatus;
use crate::error::{CliError, ConfigError};
use crate::layer::LayerId;
use crate::pool::PoolStats;
use crate::resource::{MemoryTransport, Template};
use crate::runtime::ViewRuntime;
use crate::view::{ViewConfig, ViewContract, ViewData, ViewParts};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// `viewdeck check` result
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub source: String,
    pub layers: Vec<LayerRow>,
    pub views: Vec<ViewConfig>,
    pub max_pool_size: usize,
    pub cache_templates: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerRow {
    pub layer: LayerId,
    pub z_index: i32,
}

/// `viewdeck simulate` result
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub steps: Vec<StepReport>,
    pub events: Vec<String>,
    pub views: Vec<ViewStatus>,
    pub requests: BTreeMap<String, usize>,
    pub pool: PoolStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: String,
    pub ok: bool,
    pub detail: String,
}

/// Runtime context for CLI execution: project root, config path, loaded config.
pub struct RunContext {
    root: PathBuf,
    config_path: Option<PathBuf>,
    config: RuntimeConfig,
}

impl RunContext {
    /// Load configuration from `config_path` if given, otherwise from the
    /// project at `root`.
    pub fn new(root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CliError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&root)?,
        };
        Ok(Self {
            root,
            config_path,
            config,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, CliError> {
        let started = Instant::now();
        let result = match command {
            Commands::Check { format } => self.handle_check(*format),
            Commands::Simulate { script, format } => self.handle_simulate(script, *format),
            Commands::Config => self.handle_config(),
        };
        info!(
            command = command.name(),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn source(&self) -> String {
        match &self.config_path {
            Some(path) => path.display().to_string(),
            None => format!("{} (layered)", self.root.display()),
        }
    }

    fn handle_check(&self, format: OutputFormat) -> Result<String, CliError> {
        self.config.validate().map_err(|errors| {
            let lines: Vec<String> = errors.iter().map(|e| format!("  - {}", e)).collect();
            CliError::Config(ConfigError::Invalid(lines.join("\n")))
        })?;

        let report = CheckReport {
            source: self.source(),
            layers: self
                .config
                .layers
                .iter()
                .map(|layer| LayerRow {
                    layer: *layer,
                    z_index: layer.z_index(),
                })
                .collect(),
            views: self.config.views.clone(),
            max_pool_size: self.config.pool.max_pool_size,
            cache_templates: self.config.resources.cache_templates,
        };

        match format {
            OutputFormat::Json => to_json(&report),
            OutputFormat::Text => Ok(format_check_text(&report)),
        }
    }

    fn handle_config(&self) -> Result<String, CliError> {
        toml::to_string_pretty(&self.config).map_err(|e| CliError::Output(e.to_string()))
    }

    fn handle_simulate(&self, script: &str, format: OutputFormat) -> Result<String, CliError> {
        let steps = parse_script(script)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let report = runtime.block_on(simulate(self.config.clone(), steps))?;

        match format {
            OutputFormat::Json => to_json(&report),
            OutputFormat::Text => Ok(format_simulation_text(&report)),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))
}

/// View that writes its lifecycle hooks to the simulation journal.
struct JournalView {
    id: String,
    journal: Arc<Mutex<Vec<String>>>,
}

impl JournalView {
    fn record(&self, event: &str) {
        self.journal.lock().push(format!("{}: {}", self.id, event));
    }
}

#[async_trait]
impl ViewContract for JournalView {
    async fn initialize(&self, _data: &ViewData) {
        self.record("initialize");
    }

    async fn on_opened(&self) {
        self.record("opened");
    }

    async fn on_closed(&self) {
        self.record("closed");
    }

    async fn on_cleanup(&self) {
        self.record("cleanup");
    }
}

/// Build an in-memory runtime whose transport serves a template for every
/// configured view, then run `steps` against its directory in order.
pub(crate) async fn simulate(
    config: RuntimeConfig,
    steps: Vec<ScriptStep>,
) -> Result<SimulationReport, CliError> {
    let transport = Arc::new(MemoryTransport::new());
    let runtime = ViewRuntime::builder(config)
        .transport(transport.clone())
        .tween(Arc::new(InstantTween))
        .build()?;

    let journal = Arc::new(Mutex::new(Vec::new()));
    for view in &runtime.config().views {
        let id = view.id.clone();
        let journal = Arc::clone(&journal);
        let animations = Arc::clone(runtime.animations());
        transport.insert_template(Template::new(view.template_path.clone(), move || {
            ViewParts::new()
                .with_view(Arc::new(JournalView {
                    id: id.clone(),
                    journal: Arc::clone(&journal),
                }) as Arc<dyn ViewContract>)
                .with_animation(Arc::new(crate::animation::ViewAnimator::new(Arc::clone(
                    &animations,
                ))) as Arc<dyn AnimationPort>)
        }));
    }

    let directory = runtime.directory();
    let mut reports = Vec::with_capacity(steps.len());
    for step in &steps {
        debug!(step = %step, "Running script step");
        let outcome = match step {
            ScriptStep::Open(id) => directory
                .open_registered(id, serde_json::Value::Null)
                .await
                .map(|instance| format!("node {}", instance.node_id())),
            ScriptStep::Close(id) => directory
                .close(id, false)
                .await
                .map(|()| directory.workflow().state(id).to_string()),
            ScriptStep::Destroy(id) => directory
                .close(id, true)
                .await
                .map(|()| directory.workflow().state(id).to_string()),
            ScriptStep::Prewarm(id, count) => directory
                .prewarm(id, *count)
                .await
                .map(|created| format!("{} created", created)),
        };
        reports.push(match outcome {
            Ok(detail) => StepReport {
                step: step.to_string(),
                ok: true,
                detail,
            },
            Err(err) => StepReport {
                step: step.to_string(),
                ok: false,
                detail: err.to_string(),
            },
        });
    }

    let report = SimulationReport {
        steps: reports,
        events: journal.lock().clone(),
        views: directory.snapshot(),
        requests: transport.request_counts().into_iter().collect(),
        pool: runtime.pool().stats(),
    };
    runtime.shutdown().await;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::ViewState;

    fn config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.views = vec![
            ViewConfig::new("shop", "tpl/shop", LayerId::Popup).cache_on_close(true),
            ViewConfig::new("bag", "tpl/bag", LayerId::Normal),
        ];
        config
    }

    #[tokio::test]
    async fn simulation_reports_steps_and_state() {
        let steps = parse_script("open shop; close shop; open shop; open bag; destroy bag; open ghost")
            .unwrap();

        let report = simulate(config(), steps).await.unwrap();

        let oks: Vec<bool> = report.steps.iter().map(|s| s.ok).collect();
        assert_eq!(oks, vec![true, true, true, true, true, false]);
        assert_eq!(report.requests.get("tpl/shop"), Some(&1));
        assert_eq!(report.requests.get("tpl/bag"), Some(&1));

        let states: Vec<(String, ViewState)> = report
            .views
            .iter()
            .map(|row| (row.id.clone(), row.state))
            .collect();
        assert_eq!(
            states,
            vec![
                ("bag".to_string(), ViewState::Absent),
                ("shop".to_string(), ViewState::Open)
            ]
        );
        assert_eq!(
            report.events.iter().filter(|e| *e == "shop: initialize").count(),
            2
        );
        assert!(report.events.contains(&"bag: cleanup".to_string()));
    }

    #[test]
    fn check_rejects_invalid_config() {
        let mut config = config();
        config.views.push(ViewConfig::new("shop", "tpl/dup", LayerId::Top));
        let context = RunContext {
            root: PathBuf::from("."),
            config_path: None,
            config,
        };

        let err = context
            .execute(&Commands::Check {
                format: OutputFormat::Text,
            })
            .unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn config_prints_effective_toml() {
        let context = RunContext {
            root: PathBuf::from("."),
            config_path: None,
            config: config(),
        };

        let output = context.execute(&Commands::Config).unwrap();
        let parsed: RuntimeConfig = toml::from_str(&output).unwrap();
        assert_eq!(parsed.views, context.config().views);
        assert_eq!(parsed.pool.max_pool_size, 50);
    }

    #[test]
    fn check_renders_json() {
        let context = RunContext {
            root: PathBuf::from("."),
            config_path: None,
            config: config(),
        };

        let output = context
            .execute(&Commands::Check {
                format: OutputFormat::Json,
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["views"][0]["id"], "shop");
        assert_eq!(value["layers"][0]["layer"], "background");
        assert_eq!(value["max_pool_size"], 50);
    }
}
