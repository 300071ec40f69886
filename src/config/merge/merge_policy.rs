//! Merge rules: built-in defaults underneath every other source.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("viewport.width", 1280.0)?
        .set_default("viewport.height", 720.0)?
        .set_default("pool.max_pool_size", crate::pool::DEFAULT_MAX_POOL_SIZE as i64)?
        .set_default("pool.prewarm_batch", crate::directory::DEFAULT_PREWARM_BATCH as i64)?
        .set_default("resources.cache_templates", false)?
        .set_default("animation.show_duration_ms", 300_i64)?
        .set_default("animation.hide_duration_ms", 300_i64)?
        .set_default("logging.level", "info")
}
