//! End-to-end open/close scenarios through the runtime's directory.

use crate::integration::test_utils::{settle, Harness, ScriptedAnimation};
use futures::future::join_all;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use viewdeck::config::RuntimeConfig;
use viewdeck::{LayerId, ViewConfig, ViewError, ViewState};

fn shop() -> ViewConfig {
    ViewConfig::new("shop", "tpl/shop", LayerId::Popup).cache_on_close(true)
}

fn bag() -> ViewConfig {
    ViewConfig::new("bag", "tpl/bag", LayerId::Normal)
}

#[tokio::test]
async fn test_concurrent_opens_share_one_instance() {
    let harness = Harness::new(RuntimeConfig::default());
    let view = harness.template("tpl/shop");
    let directory = harness.runtime.directory();

    let results = join_all((0..5).map(|_| directory.open(shop(), json!({"tab": 1})))).await;

    let nodes: Vec<_> = results
        .into_iter()
        .map(|r| r.unwrap().node_id())
        .collect();
    assert!(nodes.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(view.inits(), 1);
    assert_eq!(view.opened(), 1);
    assert_eq!(harness.transport.request_count("tpl/shop"), 1);
    assert_eq!(directory.workflow().state("shop"), ViewState::Open);

    let popup = harness.runtime.layers().get(LayerId::Popup).unwrap();
    let instance = directory.instance("shop").unwrap();
    assert!(popup.has_child(instance.node()));
    assert!(instance.is_active());
}

#[tokio::test]
async fn test_cached_view_reopens_without_loading() {
    let harness = Harness::new(RuntimeConfig::default());
    let view = harness.template("tpl/shop");
    let directory = harness.runtime.directory();

    let first = directory.open(shop(), json!({"page": 1})).await.unwrap();
    directory.close("shop", false).await.unwrap();
    assert_eq!(directory.workflow().state("shop"), ViewState::Cached);
    assert!(!first.is_active());
    assert!(first.is_valid());
    assert_eq!(view.closed(), 1);

    let second = directory.open(shop(), json!({"page": 2})).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(view.inits(), 2);
    assert_eq!(*view.last_data.lock(), Some(json!({"page": 2})));
    assert_eq!(harness.transport.request_count("tpl/shop"), 1);
    assert_eq!(directory.workflow().state("shop"), ViewState::Open);
}

#[tokio::test]
async fn test_uncached_close_destroys_instance() {
    let harness = Harness::new(RuntimeConfig::default());
    let view = harness.template("tpl/bag");
    let directory = harness.runtime.directory();

    let instance = directory.open(bag(), json!(null)).await.unwrap();
    directory.close("bag", false).await.unwrap();

    assert!(!instance.is_valid());
    assert_eq!(view.closed(), 1);
    assert_eq!(view.cleanups(), 1);
    assert_eq!(directory.workflow().state("bag"), ViewState::Absent);
    assert!(directory.instance("bag").is_none());

    // Template caching is off by default, so the next open loads again.
    let reopened = directory.open(bag(), json!(null)).await.unwrap();
    assert_ne!(instance, reopened);
    assert_eq!(harness.transport.request_count("tpl/bag"), 2);
    assert_eq!(view.inits(), 2);
}

#[tokio::test]
async fn test_force_destroy_skips_cache() {
    let harness = Harness::new(RuntimeConfig::default());
    let view = harness.template("tpl/shop");
    let directory = harness.runtime.directory();

    let instance = directory.open(shop(), json!(null)).await.unwrap();
    directory.close("shop", false).await.unwrap();
    assert_eq!(directory.workflow().state("shop"), ViewState::Cached);

    directory.close("shop", true).await.unwrap();
    assert!(!instance.is_valid());
    assert_eq!(view.cleanups(), 1);
    assert_eq!(directory.workflow().state("shop"), ViewState::Absent);
    assert!(!directory.is_open("shop"));
}

#[tokio::test]
async fn test_failed_load_can_be_retried() {
    let harness = Harness::new(RuntimeConfig::default());
    let view = harness.template("tpl/shop");
    harness.transport.fail("tpl/shop", "network down");
    let directory = harness.runtime.directory();

    let err = directory.open(shop(), json!(null)).await.unwrap_err();
    assert!(matches!(err, ViewError::Load(_)));
    assert!(err.is_retryable());
    assert_eq!(directory.workflow().state("shop"), ViewState::Absent);
    assert_eq!(view.inits(), 0);

    harness.transport.clear_failure("tpl/shop");
    directory.open(shop(), json!(null)).await.unwrap();
    assert_eq!(harness.transport.request_count("tpl/shop"), 2);
    assert_eq!(view.inits(), 1);
}

#[tokio::test]
async fn test_failed_show_destroys_fresh_instance() {
    let harness = Harness::new(RuntimeConfig::default());
    let animation = Arc::new(ScriptedAnimation::default());
    *animation.fail_show.lock() = true;
    let view = harness.scripted_template("tpl/shop", animation.clone());
    let directory = harness.runtime.directory();

    let err = directory.open(shop(), json!(null)).await.unwrap_err();
    assert!(matches!(err, ViewError::Animation(_)));
    assert_eq!(view.cleanups(), 1);
    assert_eq!(view.opened(), 0);
    assert_eq!(directory.workflow().state("shop"), ViewState::Absent);
    let popup = harness.runtime.layers().get(LayerId::Popup).unwrap();
    assert_eq!(popup.child_count(), 0);

    *animation.fail_show.lock() = false;
    directory.open(shop(), json!(null)).await.unwrap();
    assert_eq!(view.opened(), 1);
    assert_eq!(animation.shows.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_state_is_opening_while_template_loads() {
    let harness = Harness::new(RuntimeConfig::default());
    harness.template("tpl/shop");
    harness.transport.hold("tpl/shop");
    let directory = harness.runtime.directory();

    let observer = async {
        settle().await;
        let seen = directory.workflow().state("shop");
        harness.transport.resume("tpl/shop");
        seen
    };
    let (opened, seen) = tokio::join!(directory.open(shop(), json!(null)), observer);

    assert_eq!(seen, ViewState::Opening);
    assert!(opened.is_ok());
    assert_eq!(directory.workflow().state("shop"), ViewState::Open);
}

#[tokio::test]
async fn test_open_waits_for_in_flight_close() {
    let harness = Harness::new(RuntimeConfig::default());
    let animation = Arc::new(ScriptedAnimation::default());
    let view = harness.scripted_template("tpl/shop", animation.clone());
    let directory = harness.runtime.directory();

    let first = directory.open(shop(), json!(null)).await.unwrap();

    let (closed, reopened) = tokio::join!(
        directory.close("shop", false),
        directory.open(shop(), json!(null))
    );
    closed.unwrap();
    let reopened = reopened.unwrap();

    // The close ran to completion before the open reactivated the cached instance.
    assert_eq!(first, reopened);
    assert_eq!(animation.hides.load(Ordering::SeqCst), 1);
    assert_eq!(animation.shows.load(Ordering::SeqCst), 2);
    assert_eq!(view.closed(), 1);
    assert_eq!(view.inits(), 2);
    assert_eq!(directory.workflow().state("shop"), ViewState::Open);
}

#[tokio::test]
async fn test_concurrent_closes_destroy_once() {
    let harness = Harness::new(RuntimeConfig::default());
    let animation = Arc::new(ScriptedAnimation::default());
    let view = harness.scripted_template("tpl/bag", animation.clone());
    let directory = harness.runtime.directory();

    let instance = directory.open(bag(), json!(null)).await.unwrap();

    let (first, second, forced) = tokio::join!(
        directory.close("bag", false),
        directory.close("bag", false),
        directory.close("bag", true)
    );
    first.unwrap();
    second.unwrap();
    forced.unwrap();

    assert_eq!(animation.hides.load(Ordering::SeqCst), 1);
    assert_eq!(view.closed(), 1);
    assert_eq!(view.cleanups(), 1);
    assert!(!instance.is_valid());
    assert_eq!(directory.workflow().state("bag"), ViewState::Absent);

    // Later closes find nothing to close.
    directory.close("bag", true).await.unwrap();
    assert_eq!(view.cleanups(), 1);
}

#[tokio::test]
async fn test_repeated_force_close_of_cached_view_destroys_once() {
    let harness = Harness::new(RuntimeConfig::default());
    let view = harness.template("tpl/shop");
    let directory = harness.runtime.directory();

    directory.open(shop(), json!(null)).await.unwrap();
    directory.close("shop", false).await.unwrap();

    let (first, second) = tokio::join!(
        directory.close("shop", true),
        directory.close("shop", true)
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(view.closed(), 1);
    assert_eq!(view.cleanups(), 1);
    assert_eq!(directory.workflow().state("shop"), ViewState::Absent);
}

#[tokio::test]
async fn test_views_on_different_layers_are_independent() {
    let harness = Harness::new(RuntimeConfig::default());
    harness.template("tpl/shop");
    harness.template("tpl/bag");
    let directory = harness.runtime.directory();

    let (shop_open, bag_open) = tokio::join!(
        directory.open(shop(), json!(null)),
        directory.open(bag(), json!(null))
    );
    shop_open.unwrap();
    bag_open.unwrap();

    assert_eq!(directory.workflow().active_ids(), vec!["bag", "shop"]);
    let normal = harness.runtime.layers().get(LayerId::Normal).unwrap();
    let popup = harness.runtime.layers().get(LayerId::Popup).unwrap();
    assert_eq!(normal.child_count(), 1);
    assert_eq!(popup.child_count(), 1);
}

#[tokio::test]
async fn test_shutdown_rejects_new_opens() {
    let harness = Harness::new(RuntimeConfig::default());
    let view = harness.template("tpl/shop");
    let directory = harness.runtime.directory();

    let instance = directory.open(shop(), json!(null)).await.unwrap();
    harness.runtime.shutdown().await;

    assert!(harness.runtime.is_shut_down());
    assert!(!instance.is_valid());
    assert_eq!(view.cleanups(), 1);
    let err = directory.open(shop(), json!(null)).await.unwrap_err();
    assert_eq!(err, ViewError::ShutDown);
}
