//! View Runtime
//!
//! Explicitly constructed orchestrator context. Owns one of each component,
//! wired together from a [`RuntimeConfig`], and tears them all down in
//! [`ViewRuntime::shutdown`].

use crate::animation::{AnimationLibrary, TimedTween, TweenEngine, ViewAnimator};
use crate::config::RuntimeConfig;
use crate::directory::ViewDirectory;
use crate::error::ConfigError;
use crate::layer::LayerRegistry;
use crate::pool::InstancePool;
use crate::resource::{AssetTransport, MemoryTransport, ResourceManager};
use crate::scene::SceneNode;
use crate::workflow::ViewWorkflow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub struct ViewRuntimeBuilder {
    config: RuntimeConfig,
    transport: Option<Arc<dyn AssetTransport>>,
    tween: Option<Arc<dyn TweenEngine>>,
}

impl ViewRuntimeBuilder {
    pub fn transport(mut self, transport: Arc<dyn AssetTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn tween(mut self, tween: Arc<dyn TweenEngine>) -> Self {
        self.tween = Some(tween);
        self
    }

    /// Validate the configuration and wire the components. Without an explicit
    /// transport an empty [`MemoryTransport`] is used; without a tween engine,
    /// [`TimedTween`].
    pub fn build(self) -> Result<ViewRuntime, ConfigError> {
        let config = self.config;
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ConfigError::Invalid(messages.join("\n"))
        })?;

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(MemoryTransport::new()));
        let tween = self.tween.unwrap_or_else(|| Arc::new(TimedTween));

        let root = SceneNode::new("root");
        root.set_size(config.viewport.size());
        let layers = Arc::new(LayerRegistry::new());
        layers.initialize(&root, config.viewport.size(), &config.layers);

        let resources = Arc::new(ResourceManager::with_transport(transport));

        let pool = Arc::new(InstancePool::new(config.pool.max_pool_size));
        for (template, cap) in &config.pool.caps {
            pool.set_cap(template.clone(), *cap);
        }

        let animations = Arc::new(AnimationLibrary::with_durations(
            tween,
            config.animation.show_duration(),
            config.animation.hide_duration(),
        ));

        let workflow = Arc::new(
            ViewWorkflow::new(Arc::clone(&resources), Arc::clone(&pool), Arc::clone(&layers))
                .with_template_cache(config.resources.cache_templates),
        );
        let directory = Arc::new(
            ViewDirectory::new(Arc::clone(&workflow)).with_prewarm_batch(config.pool.prewarm_batch),
        );
        for view in &config.views {
            directory
                .register(view.clone())
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        info!(
            layers = config.layers.len(),
            views = config.views.len(),
            max_pool_size = config.pool.max_pool_size,
            "View runtime ready"
        );

        Ok(ViewRuntime {
            config,
            root,
            layers,
            resources,
            pool,
            animations,
            workflow,
            directory,
            shut_down: AtomicBool::new(false),
        })
    }
}

pub struct ViewRuntime {
    config: RuntimeConfig,
    root: Arc<SceneNode>,
    layers: Arc<LayerRegistry>,
    resources: Arc<ResourceManager>,
    pool: Arc<InstancePool>,
    animations: Arc<AnimationLibrary>,
    workflow: Arc<ViewWorkflow>,
    directory: Arc<ViewDirectory>,
    shut_down: AtomicBool,
}

impl ViewRuntime {
    pub fn builder(config: RuntimeConfig) -> ViewRuntimeBuilder {
        ViewRuntimeBuilder {
            config,
            transport: None,
            tween: None,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn root(&self) -> &Arc<SceneNode> {
        &self.root
    }

    pub fn layers(&self) -> &Arc<LayerRegistry> {
        &self.layers
    }

    pub fn resources(&self) -> &Arc<ResourceManager> {
        &self.resources
    }

    pub fn pool(&self) -> &Arc<InstancePool> {
        &self.pool
    }

    pub fn animations(&self) -> &Arc<AnimationLibrary> {
        &self.animations
    }

    pub fn workflow(&self) -> &Arc<ViewWorkflow> {
        &self.workflow
    }

    pub fn directory(&self) -> &Arc<ViewDirectory> {
        &self.directory
    }

    /// Fade animator bound to this runtime's animation library.
    pub fn animator(&self) -> ViewAnimator {
        ViewAnimator::new(Arc::clone(&self.animations))
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Stop animations, destroy active and pooled instances, cancel loads and
    /// drop the asset cache. Idempotent.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let destroyed = self.workflow.shutdown().await;
        self.resources.loader().cancel_all();
        let drained = self.pool.clear_all();
        self.resources.clear();

        info!(destroyed, drained, "View runtime shut down");
    }
}
