//! Free-list caps and instance reuse.

use crate::integration::test_utils::CountingView;
use std::sync::Arc;
use viewdeck::error::PoolError;
use viewdeck::pool::{InstancePool, Poolable, Released};
use viewdeck::resource::Template;
use viewdeck::ViewParts;

fn card_template(hooks: Arc<CountingView>) -> Template {
    Template::new("tpl/card", move || {
        ViewParts::new().with_poolable(hooks.clone() as Arc<dyn Poolable>)
    })
}

#[test]
fn test_release_beyond_cap_destroys() {
    let pool = InstancePool::new(50);
    pool.set_cap("tpl/card", 2);
    let template = card_template(Arc::new(CountingView::default()));

    let instances: Vec<_> = (0..3).map(|_| pool.acquire(&template)).collect();
    let outcomes: Vec<Released> = instances
        .iter()
        .map(|instance| pool.release(instance.clone(), "tpl/card").unwrap())
        .collect();

    assert_eq!(
        outcomes,
        vec![Released::Pooled, Released::Pooled, Released::Destroyed]
    );
    assert_eq!(pool.free_count("tpl/card"), 2);
    assert!(!instances[2].is_valid());
    assert!(instances[0].is_valid());
    assert_eq!(pool.stats().destroyed, 1);
}

#[test]
fn test_reuse_spawns_and_recycles() {
    let hooks = Arc::new(CountingView::default());
    let pool = InstancePool::default();
    let template = card_template(hooks.clone());

    let first = pool.acquire(&template);
    pool.release(first.clone(), "tpl/card").unwrap();
    assert!(!first.is_active());

    let second = pool.acquire(&template);
    assert_eq!(first, second);
    assert_eq!(hooks.spawned(), 2);
    assert_eq!(hooks.recycled.load(std::sync::atomic::Ordering::SeqCst), 1);

    let stats = pool.stats();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.reused, 1);
}

#[test]
fn test_release_of_destroyed_instance_is_rejected() {
    let pool = InstancePool::new(1);
    let template = card_template(Arc::new(CountingView::default()));

    let kept = pool.acquire(&template);
    let extra = pool.acquire(&template);
    pool.release(kept, "tpl/card").unwrap();
    assert_eq!(pool.release(extra.clone(), "tpl/card"), Ok(Released::Destroyed));

    let err = pool.release(extra, "tpl/card").unwrap_err();
    assert!(matches!(err, PoolError::InvalidInstance { .. }));
    assert_eq!(pool.free_count("tpl/card"), 1);
}

#[tokio::test]
async fn test_staged_prewarm_respects_cap() {
    let pool = InstancePool::new(4);
    let template = card_template(Arc::new(CountingView::default()));

    assert_eq!(pool.prewarm_staged(&template, 10, 3).await, 4);
    assert_eq!(pool.free_count("tpl/card"), 4);
    assert_eq!(pool.prewarm_staged(&template, 10, 3).await, 0);

    assert_eq!(pool.clear_all(), 4);
    assert_eq!(pool.free_count("tpl/card"), 0);
}
