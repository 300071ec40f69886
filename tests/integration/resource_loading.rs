//! Template loading through the runtime's resource manager.

use crate::integration::test_utils::Harness;
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use viewdeck::config::RuntimeConfig;
use viewdeck::error::LoadCause;
use viewdeck::resource::{AssetData, AssetKind};

#[tokio::test]
async fn test_concurrent_loads_issue_one_request() {
    let harness = Harness::new(RuntimeConfig::default());
    harness.template("tpl/shop");
    let resources = harness.runtime.resources();

    let results = join_all((0..8).map(|_| resources.load_template("tpl/shop", false))).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(harness.transport.request_count("tpl/shop"), 1);
    assert!(!resources.loader().in_flight("tpl/shop"));
}

#[tokio::test]
async fn test_cached_template_skips_transport() {
    let harness = Harness::new(RuntimeConfig::default());
    harness.template("tpl/shop");
    let resources = harness.runtime.resources();

    resources.load_template("tpl/shop", true).await.unwrap();
    resources.load_template("tpl/shop", true).await.unwrap();
    assert_eq!(harness.transport.request_count("tpl/shop"), 1);
    assert!(resources.cached("tpl/shop").is_some());

    resources.load_template("tpl/shop", false).await.unwrap();
    assert_eq!(harness.transport.request_count("tpl/shop"), 2);
}

#[tokio::test]
async fn test_wrong_kind_is_rejected() {
    let harness = Harness::new(RuntimeConfig::default());
    harness
        .transport
        .insert("data/items", AssetData::Json(Arc::new(serde_json::json!({"items": []}))));

    let err = harness
        .runtime
        .resources()
        .load_template("data/items", false)
        .await
        .unwrap_err();
    assert!(matches!(err.cause, LoadCause::KindMismatch { .. }));
    assert_eq!(err.path, "data/items");
}

#[tokio::test]
async fn test_empty_path_fails_without_request() {
    let harness = Harness::new(RuntimeConfig::default());
    let err = harness
        .runtime
        .resources()
        .load_async("", AssetKind::Json, true)
        .await
        .unwrap_err();
    assert_eq!(err.cause, LoadCause::MissingPath);
    assert_eq!(harness.transport.total_requests(), 0);
}

#[tokio::test]
async fn test_callback_load_delivers_result() {
    let harness = Harness::new(RuntimeConfig::default());
    harness.template("tpl/shop");
    let resources = harness.runtime.resources();

    let (tx, rx) = tokio::sync::oneshot::channel();
    resources.load("tpl/shop", AssetKind::Template, true, move |result| {
        let _ = tx.send(result.map(|asset| asset.kind()));
    });
    assert_eq!(rx.await.unwrap().unwrap(), AssetKind::Template);

    // Cache hit runs the callback before `load` returns.
    let seen = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&seen);
    resources.load("tpl/shop", AssetKind::Template, true, move |result| {
        *slot.lock().unwrap() = Some(result.is_ok());
    });
    assert_eq!(*seen.lock().unwrap(), Some(true));
    assert_eq!(harness.transport.request_count("tpl/shop"), 1);
}

#[tokio::test]
async fn test_shutdown_cancels_held_load() {
    let harness = Harness::new(RuntimeConfig::default());
    harness.template("tpl/shop");
    harness.transport.hold("tpl/shop");
    let resources = harness.runtime.resources();

    let load = resources.load_template("tpl/shop", true);
    let cancel = async {
        crate::integration::test_utils::settle().await;
        harness.runtime.shutdown().await;
    };
    let (result, ()) = tokio::join!(load, cancel);

    let err = result.unwrap_err();
    assert_eq!(err.cause, LoadCause::Cancelled);
    assert!(resources.cached("tpl/shop").is_none());
}
