//! Config loading facade: composes the merge policy, file sources and the
//! environment into one [`RuntimeConfig`].

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::RuntimeConfig;
use crate::error::ConfigError;
use config::{Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment overrides, e.g. `VIEWDECK__POOL__MAX_POOL_SIZE=8`
pub const ENV_PREFIX: &str = "VIEWDECK";
pub const ENV_SEPARATOR: &str = "__";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the project at `project_root`.
    ///
    /// Precedence (lowest to highest): defaults, user file, `config/viewdeck.toml`,
    /// `config/{VIEWDECK_ENV}.toml`, environment.
    pub fn load(project_root: &Path) -> Result<RuntimeConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, project_root)?;
        let settings = builder.add_source(Self::environment()).build()?;

        let config: RuntimeConfig = settings.try_deserialize()?;
        debug!(
            root = %project_root.display(),
            views = config.views.len(),
            "Loaded runtime configuration"
        );
        Ok(config)
    }

    /// Load one explicit file over the defaults. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<RuntimeConfig, ConfigError> {
        let settings = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Built-in defaults only.
    pub fn defaults() -> RuntimeConfig {
        RuntimeConfig::default()
    }

    pub fn user_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
    }
}
