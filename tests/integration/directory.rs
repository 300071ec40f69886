//! Directory registration, bulk close, prewarm and snapshots.

use crate::integration::test_utils::Harness;
use serde_json::json;
use std::sync::Arc;
use viewdeck::config::RuntimeConfig;
use viewdeck::error::LoadCause;
use viewdeck::resource::{AssetData, Template};
use viewdeck::{LayerId, ViewConfig, ViewError, ViewState};

fn configured() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.views = vec![
        ViewConfig::new("shop", "tpl/shop", LayerId::Popup)
            .cache_on_close(true)
            .priority(5),
        ViewConfig::new("hud", "tpl/hud", LayerId::Bottom),
    ];
    config
}

#[tokio::test]
async fn test_configured_views_are_registered() {
    let harness = Harness::new(configured());
    let directory = harness.runtime.directory();

    assert_eq!(directory.registered(), vec!["hud", "shop"]);
    assert_eq!(directory.config("shop").unwrap().priority, 5);

    // First registration wins.
    let replaced = directory
        .register(ViewConfig::new("shop", "tpl/other", LayerId::Top))
        .unwrap();
    assert!(!replaced);
    assert_eq!(directory.config("shop").unwrap().template_path, "tpl/shop");
}

#[tokio::test]
async fn test_open_registered_rejects_unknown_id() {
    let harness = Harness::new(configured());
    let err = harness
        .runtime
        .directory()
        .open_registered("ghost", json!(null))
        .await
        .unwrap_err();
    assert!(matches!(err, ViewError::InvalidConfig(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_close_all_clears_every_view() {
    let harness = Harness::new(configured());
    let shop = harness.template("tpl/shop");
    let hud = harness.template("tpl/hud");
    let directory = harness.runtime.directory();

    directory.open_registered("shop", json!(null)).await.unwrap();
    directory.open_registered("hud", json!(null)).await.unwrap();

    let closed = directory.close_all(false).await.unwrap();
    assert_eq!(closed, 2);
    assert_eq!(directory.workflow().state("shop"), ViewState::Cached);
    assert_eq!(directory.workflow().state("hud"), ViewState::Absent);
    assert_eq!(shop.cleanups(), 0);
    assert_eq!(hud.cleanups(), 1);

    directory.close_all(true).await.unwrap();
    assert_eq!(directory.workflow().state("shop"), ViewState::Absent);
    assert_eq!(shop.cleanups(), 1);
}

#[tokio::test]
async fn test_prewarm_feeds_first_open() {
    let harness = Harness::new(configured());
    let view = harness.template("tpl/shop");
    let directory = harness.runtime.directory();

    let created = directory.prewarm("shop", 3).await.unwrap();
    assert_eq!(created, 3);
    assert_eq!(harness.runtime.pool().free_count("tpl/shop"), 3);

    directory.open_registered("shop", json!(null)).await.unwrap();
    assert_eq!(harness.runtime.pool().free_count("tpl/shop"), 2);
    assert_eq!(view.spawned(), 1);
    assert_eq!(harness.runtime.pool().stats().reused, 1);
    assert_eq!(harness.transport.request_count("tpl/shop"), 1);
}

#[tokio::test]
async fn test_snapshot_reports_state_per_view() {
    let harness = Harness::new(configured());
    harness.template("tpl/shop");
    harness.template("tpl/hud");
    let directory = harness.runtime.directory();

    directory.open_registered("shop", json!(null)).await.unwrap();

    let snapshot = directory.snapshot();
    let states: Vec<(&str, ViewState)> = snapshot
        .iter()
        .map(|row| (row.id.as_str(), row.state))
        .collect();
    assert_eq!(
        states,
        vec![("hud", ViewState::Absent), ("shop", ViewState::Open)]
    );
    let value = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(value[1]["state"], "open");
    assert_eq!(value[1]["layer"], "popup");
}

#[tokio::test]
async fn test_prewarm_rejects_template_keyed_off_its_path() {
    let harness = Harness::new(configured());
    harness.transport.insert(
        "tpl/shop",
        AssetData::Template(Arc::new(Template::empty("tpl/shop-v2"))),
    );
    let directory = harness.runtime.directory();

    let err = directory.prewarm("shop", 3).await.unwrap_err();
    assert!(matches!(
        err,
        ViewError::Load(ref load) if matches!(load.cause, LoadCause::KeyMismatch { .. })
    ));
    assert_eq!(harness.runtime.pool().free_count("tpl/shop"), 0);
    assert_eq!(harness.runtime.pool().free_count("tpl/shop-v2"), 0);
}
