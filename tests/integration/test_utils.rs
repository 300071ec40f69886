//! Shared test utilities for integration tests
//!
//! A runtime harness over a `MemoryTransport` with instant tweens, plus views
//! and animation ports that count what happens to them.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use viewdeck::animation::{AnimationPort, InstantTween, ViewAnimator};
use viewdeck::config::RuntimeConfig;
use viewdeck::error::AnimationError;
use viewdeck::pool::Poolable;
use viewdeck::resource::{MemoryTransport, Template};
use viewdeck::scene::SceneNode;
use viewdeck::{ViewContract, ViewData, ViewParts, ViewRuntime};

/// Counts lifecycle hook calls across every instance of one template.
#[derive(Default)]
pub struct CountingView {
    pub inits: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub cleanups: AtomicUsize,
    pub spawned: AtomicUsize,
    pub recycled: AtomicUsize,
    pub last_data: Mutex<Option<ViewData>>,
}

impl CountingView {
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn cleanups(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ViewContract for CountingView {
    async fn initialize(&self, data: &ViewData) {
        self.inits.fetch_add(1, Ordering::SeqCst);
        *self.last_data.lock() = Some(data.clone());
    }

    async fn on_opened(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_closed(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_cleanup(&self) {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

impl Poolable for CountingView {
    fn on_spawn(&self) {
        self.spawned.fetch_add(1, Ordering::SeqCst);
    }

    fn on_recycle(&self) {
        self.recycled.fetch_add(1, Ordering::SeqCst);
    }
}

/// Animation port that records plays and can be told to fail.
#[derive(Default)]
pub struct ScriptedAnimation {
    pub shows: AtomicUsize,
    pub hides: AtomicUsize,
    pub stops: AtomicUsize,
    pub fail_show: Mutex<bool>,
}

#[async_trait]
impl AnimationPort for ScriptedAnimation {
    async fn play_show(&self, node: &SceneNode) -> Result<(), AnimationError> {
        self.shows.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if *self.fail_show.lock() {
            return Err(AnimationError::AnimationBusy {
                node_id: node.id().as_u64(),
            });
        }
        node.set_active(true);
        Ok(())
    }

    async fn play_hide(&self, node: &SceneNode) -> Result<(), AnimationError> {
        self.hides.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        node.set_active(false);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        false
    }
}

pub struct Harness {
    pub runtime: ViewRuntime,
    pub transport: Arc<MemoryTransport>,
}

impl Harness {
    pub fn new(config: RuntimeConfig) -> Self {
        let transport = Arc::new(MemoryTransport::new());
        let runtime = ViewRuntime::builder(config)
            .transport(transport.clone())
            .tween(Arc::new(InstantTween))
            .build()
            .expect("valid test config");
        Self { runtime, transport }
    }

    /// Serve a template at `path` whose instances share one counting view and
    /// each get a fresh fade animator.
    pub fn template(&self, path: &str) -> Arc<CountingView> {
        let view = Arc::new(CountingView::default());
        let shared = view.clone();
        let animations = self.runtime.animations().clone();
        self.transport.insert_template(Template::new(path, move || {
            ViewParts::new()
                .with_view(shared.clone() as Arc<dyn ViewContract>)
                .with_poolable(shared.clone() as Arc<dyn Poolable>)
                .with_animation(
                    Arc::new(ViewAnimator::new(animations.clone())) as Arc<dyn AnimationPort>
                )
        }));
        view
    }

    /// Serve a template whose instances share `animation`.
    pub fn scripted_template(
        &self,
        path: &str,
        animation: Arc<ScriptedAnimation>,
    ) -> Arc<CountingView> {
        let view = Arc::new(CountingView::default());
        let shared = view.clone();
        self.transport.insert_template(Template::new(path, move || {
            ViewParts::new()
                .with_view(shared.clone() as Arc<dyn ViewContract>)
                .with_animation(animation.clone() as Arc<dyn AnimationPort>)
        }));
        view
    }
}

/// Let spawned load tasks and yielded futures make progress.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
