//! Configuration System
//!
//! Runtime configuration for the view orchestrator: viewport, layers, pool
//! caps, template caching, animation timings, preregistered views and logging.
//! Loaded hierarchically (defaults, user file, project files, environment) by
//! [`ConfigLoader`] and validated as a whole.

use crate::layer::LayerId;
use crate::logging::LoggingConfig;
use crate::scene::Size;
use crate::view::ViewConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

mod facade;
mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod global_file;
    pub mod workspace_file;
}

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,

    /// Layers to build under the root node
    #[serde(default = "default_layers")]
    pub layers: Vec<LayerId>,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub resources: ResourceConfig,

    #[serde(default)]
    pub animation: AnimationConfig,

    /// Views registered with the directory at startup
    #[serde(default)]
    pub views: Vec<ViewConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_layers() -> Vec<LayerId> {
    LayerId::ALL.to_vec()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            layers: default_layers(),
            pool: PoolConfig::default(),
            resources: ResourceConfig::default(),
            animation: AnimationConfig::default(),
            views: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Design resolution the layer containers are sized to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl ViewportConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Default free-list cap per template
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,

    /// Instances created per executor turn when prewarming
    #[serde(default = "default_prewarm_batch")]
    pub prewarm_batch: usize,

    /// Per-template cap overrides, keyed by template path
    #[serde(default)]
    pub caps: BTreeMap<String, usize>,
}

fn default_max_pool_size() -> usize {
    crate::pool::DEFAULT_MAX_POOL_SIZE
}

fn default_prewarm_batch() -> usize {
    crate::directory::DEFAULT_PREWARM_BATCH
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: default_max_pool_size(),
            prewarm_batch: default_prewarm_batch(),
            caps: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Keep view templates in the asset cache after loading
    #[serde(default)]
    pub cache_templates: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_duration_ms")]
    pub show_duration_ms: u64,

    #[serde(default = "default_duration_ms")]
    pub hide_duration_ms: u64,
}

fn default_duration_ms() -> u64 {
    crate::animation::library::DEFAULT_DURATION.as_millis() as u64
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            show_duration_ms: default_duration_ms(),
            hide_duration_ms: default_duration_ms(),
        }
    }
}

impl AnimationConfig {
    pub fn show_duration(&self) -> Duration {
        Duration::from_millis(self.show_duration_ms)
    }

    pub fn hide_duration(&self) -> Duration {
        Duration::from_millis(self.hide_duration_ms)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Viewport(String),
    Layers(String),
    Pool(String),
    View(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Viewport(msg) => write!(f, "Viewport: {}", msg),
            ValidationError::Layers(msg) => write!(f, "Layers: {}", msg),
            ValidationError::Pool(msg) => write!(f, "Pool: {}", msg),
            ValidationError::View(id, msg) => write!(f, "View '{}': {}", id, msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RuntimeConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let ViewportConfig { width, height } = self.viewport;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            errors.push(ValidationError::Viewport(format!(
                "size must be positive, got {}x{}",
                width, height
            )));
        }

        if self.layers.is_empty() {
            errors.push(ValidationError::Layers(
                "at least one layer is required".to_string(),
            ));
        }
        let mut seen_layers = HashSet::new();
        for layer in &self.layers {
            if !seen_layers.insert(layer) {
                errors.push(ValidationError::Layers(format!(
                    "layer '{}' listed more than once",
                    layer
                )));
            }
        }

        if self.pool.prewarm_batch == 0 {
            errors.push(ValidationError::Pool(
                "prewarm_batch must be at least 1".to_string(),
            ));
        }
        for key in self.pool.caps.keys() {
            if key.trim().is_empty() {
                errors.push(ValidationError::Pool(
                    "cap override with an empty template key".to_string(),
                ));
            }
        }

        let mut seen_views = HashSet::new();
        for view in &self.views {
            if let Err(e) = view.validate() {
                errors.push(ValidationError::View(view.id.clone(), e.to_string()));
                continue;
            }
            if !seen_views.insert(view.id.as_str()) {
                errors.push(ValidationError::View(
                    view.id.clone(),
                    "Duplicate view id".to_string(),
                ));
            }
            if !self.layers.contains(&view.layer) {
                errors.push(ValidationError::View(
                    view.id.clone(),
                    format!("layer '{}' is not configured", view.layer),
                ));
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn view(&self, id: &str) -> Option<&ViewConfig> {
        self.views.iter().find(|view| view.id == id)
    }
}
