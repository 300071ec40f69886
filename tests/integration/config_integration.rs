//! Configuration files feeding a running runtime.

use crate::integration::test_utils::Harness;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use viewdeck::config::ConfigLoader;
use viewdeck::error::ConfigError;
use viewdeck::{LayerId, ViewState};

const CONFIG: &str = r#"
[viewport]
width = 1920.0
height = 1080.0

[pool]
max_pool_size = 8

[pool.caps]
"tpl/toast" = 1

[resources]
cache_templates = true

[animation]
show_duration_ms = 0
hide_duration_ms = 0

[[views]]
id = "toast"
template_path = "tpl/toast"
layer = "toast"

[[views]]
id = "settings"
template_path = "tpl/settings"
layer = "popup"
cache_on_close = true
priority = 3
"#;

#[tokio::test]
async fn test_file_config_drives_runtime() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("viewdeck.toml");
    fs::write(&path, CONFIG).unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.views.len(), 2);

    let harness = Harness::new(config);
    let runtime = &harness.runtime;
    assert_eq!(runtime.pool().cap("tpl/toast"), 1);
    assert_eq!(runtime.pool().cap("tpl/settings"), 8);
    assert!(runtime.workflow().caches_templates());

    let popup = runtime.layers().get(LayerId::Popup).unwrap();
    assert_eq!(popup.size().width, 1920.0);

    harness.template("tpl/settings");
    let directory = runtime.directory();
    directory.open_registered("settings", json!(null)).await.unwrap();
    directory.close("settings", false).await.unwrap();
    assert_eq!(directory.workflow().state("settings"), ViewState::Cached);
    assert!(runtime.resources().cached("tpl/settings").is_some());
}

#[test]
fn test_invalid_file_reports_every_problem() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("viewdeck.toml");
    fs::write(
        &path,
        r#"
[viewport]
width = 0.0
height = 720.0

[[views]]
id = "a"
template_path = ""
layer = "popup"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);

    let transport = std::sync::Arc::new(viewdeck::resource::MemoryTransport::new());
    let err = viewdeck::ViewRuntime::builder(config)
        .transport(transport)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_missing_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}
