//! View Workflow
//!
//! Per-id lifecycle state machine: `Absent -> Opening -> Open -> Closing ->
//! {Cached | Absent}`. Opens and closes each run through their own single-flight
//! table, and an open waits for an in-flight close of the same id to settle
//! (and vice versa), so the two never interleave on one id.
//!
//! The workflow exclusively owns the active-instance table. An instance is
//! recorded only once its open succeeds; a failed fresh open destroys the
//! instance it acquired, leaving the table as it was.

use crate::error::ViewError;
use crate::layer::LayerRegistry;
use crate::pool::InstancePool;
use crate::resource::ResourceManager;
use crate::singleflight::SingleFlight;
use crate::view::{ViewConfig, ViewData, ViewInstance};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle state of one view id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Absent,
    Opening,
    Open,
    Closing,
    Cached,
}

impl ViewState {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewState::Absent => "absent",
            ViewState::Opening => "opening",
            ViewState::Open => "open",
            ViewState::Closing => "closing",
            ViewState::Cached => "cached",
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Residency {
    Open,
    Cached,
}

struct ActiveEntry {
    instance: ViewInstance,
    residency: Residency,
    opened_at: DateTime<Utc>,
}

pub struct ViewWorkflow {
    resources: Arc<ResourceManager>,
    pool: Arc<InstancePool>,
    layers: Arc<LayerRegistry>,
    opening: SingleFlight<ViewInstance>,
    closing: SingleFlight<()>,
    active: RwLock<HashMap<String, ActiveEntry>>,
    /// Fresh instances between acquisition and a settled open.
    pending: RwLock<HashMap<String, ViewInstance>>,
    cache_templates: bool,
    shut_down: AtomicBool,
}

impl ViewWorkflow {
    pub fn new(
        resources: Arc<ResourceManager>,
        pool: Arc<InstancePool>,
        layers: Arc<LayerRegistry>,
    ) -> Self {
        Self {
            resources,
            pool,
            layers,
            opening: SingleFlight::new("open"),
            closing: SingleFlight::new("close"),
            active: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
            cache_templates: false,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Keep loaded templates in the asset cache.
    pub fn with_template_cache(mut self, enabled: bool) -> Self {
        self.cache_templates = enabled;
        self
    }

    pub fn caches_templates(&self) -> bool {
        self.cache_templates
    }

    pub fn resources(&self) -> &Arc<ResourceManager> {
        &self.resources
    }

    pub fn pool(&self) -> &Arc<InstancePool> {
        &self.pool
    }

    pub fn layers(&self) -> &Arc<LayerRegistry> {
        &self.layers
    }

    /// Open the view described by `config`, reactivating its active or cached
    /// instance if there is one. Concurrent opens of one id share a result.
    pub async fn open(&self, config: &ViewConfig, data: ViewData) -> Result<ViewInstance, ViewError> {
        config.validate()?;
        self.ensure_running()?;

        loop {
            if !self.opening.is_in_flight(&config.id) {
                if let Some(settled) = self.closing.settled(&config.id) {
                    debug!(view = %config.id, "Open waiting for in-flight close");
                    let _ = settled.await;
                    continue;
                }
            }
            return self
                .opening
                .run(&config.id, || self.run_open(config, &data))
                .await;
        }
    }

    /// Close the active instance for `config.id`. Cached views are left alone
    /// unless `force_destroy` is set.
    ///
    /// Force-destroying a cached view skips the hide animation and `on_closed`;
    /// both already ran when it was cached. Only `on_cleanup` runs.
    pub async fn close(
        &self,
        config: &ViewConfig,
        instance: &ViewInstance,
        force_destroy: bool,
    ) -> Result<(), ViewError> {
        config.validate()?;

        loop {
            if !self.closing.is_in_flight(&config.id) {
                if let Some(settled) = self.opening.settled(&config.id) {
                    debug!(view = %config.id, "Close waiting for in-flight open");
                    let _ = settled.await;
                    continue;
                }
            }
            return self
                .closing
                .run(&config.id, || self.run_close(config, instance, force_destroy))
                .await;
        }
    }

    pub fn state(&self, id: &str) -> ViewState {
        if self.closing.is_in_flight(id) {
            return ViewState::Closing;
        }
        if self.opening.is_in_flight(id) {
            return ViewState::Opening;
        }
        match self.active.read().get(id).map(|entry| entry.residency) {
            Some(Residency::Open) => ViewState::Open,
            Some(Residency::Cached) => ViewState::Cached,
            None => ViewState::Absent,
        }
    }

    /// Ids with a recorded instance (open or cached), sorted.
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.active.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn active_instance(&self, id: &str) -> Option<ViewInstance> {
        self.active.read().get(id).map(|entry| entry.instance.clone())
    }

    /// When the recorded instance for `id` was first opened.
    pub fn opened_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.active.read().get(id).map(|entry| entry.opened_at)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Stop running animations and destroy every recorded instance. Later
    /// opens fail with [`ViewError::ShutDown`]. Returns how many instances were
    /// destroyed; a second call is a no-op.
    pub async fn shutdown(&self) -> usize {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return 0;
        }

        let pending: Vec<ViewInstance> = self.pending.read().values().cloned().collect();
        for instance in &pending {
            if let Some(animation) = instance.animation() {
                animation.stop();
            }
        }

        let drained: Vec<(String, ActiveEntry)> = self.active.write().drain().collect();
        for (id, entry) in &drained {
            debug!(view = %id, node = %entry.instance.node_id(), "Destroying view on shutdown");
            entry.instance.destroy().await;
        }

        info!(
            destroyed = drained.len(),
            interrupted = pending.len(),
            "View workflow shut down"
        );
        drained.len()
    }

    fn ensure_running(&self) -> Result<(), ViewError> {
        if self.is_shut_down() {
            return Err(ViewError::ShutDown);
        }
        Ok(())
    }

    async fn run_open(&self, config: &ViewConfig, data: &ViewData) -> Result<ViewInstance, ViewError> {
        self.ensure_running()?;

        let recorded = self.active_instance(&config.id);
        if let Some(instance) = recorded {
            if instance.is_valid() {
                return self.reactivate(config, instance, data).await;
            }
            warn!(view = %config.id, node = %instance.node_id(), "Dropping destroyed active instance");
            self.forget(&config.id, &instance);
        }

        let instance = self.create(config).await?;
        self.pending
            .write()
            .insert(config.id.clone(), instance.clone());
        let presented = self.present(&instance, data).await;
        self.pending.write().remove(&config.id);

        let outcome = presented.and_then(|()| self.ensure_running());
        if let Err(err) = outcome {
            warn!(view = %config.id, error = %err, "Open failed, destroying fresh instance");
            instance.destroy().await;
            return Err(err);
        }

        self.active.write().insert(
            config.id.clone(),
            ActiveEntry {
                instance: instance.clone(),
                residency: Residency::Open,
                opened_at: Utc::now(),
            },
        );
        info!(
            view = %config.id,
            layer = %config.layer,
            node = %instance.node_id(),
            "View opened"
        );
        Ok(instance)
    }

    async fn reactivate(
        &self,
        config: &ViewConfig,
        instance: ViewInstance,
        data: &ViewData,
    ) -> Result<ViewInstance, ViewError> {
        debug!(view = %config.id, node = %instance.node_id(), "Reactivating view");
        let was_active = instance.is_active();
        instance.node().set_active(true);

        if let Err(err) = self.present(&instance, data).await {
            warn!(view = %config.id, error = %err, "Reopen failed");
            if !was_active && instance.is_valid() {
                instance.node().set_active(false);
            }
            return Err(err);
        }

        if let Some(entry) = self.active.write().get_mut(&config.id) {
            if entry.instance == instance {
                entry.residency = Residency::Open;
            }
        }
        info!(view = %config.id, node = %instance.node_id(), "View reopened");
        Ok(instance)
    }

    /// Take a pooled instance or build one from the loaded template, then
    /// parent it under its layer.
    async fn create(&self, config: &ViewConfig) -> Result<ViewInstance, ViewError> {
        let instance = match self.pool.try_acquire(&config.template_path) {
            Some(instance) => {
                debug!(view = %config.id, template = %config.template_path, "Reusing pooled instance");
                instance
            }
            None => {
                let template = self
                    .resources
                    .load_template(&config.template_path, self.cache_templates)
                    .await?;
                self.pool.acquire(&template)
            }
        };

        if let Err(err) = self.layers.attach(config.layer, instance.node(), config.priority) {
            instance.destroy().await;
            return Err(err.into());
        }
        instance.tag(&config.id);
        Ok(instance)
    }

    /// initialize -> show animation -> on_opened
    async fn present(&self, instance: &ViewInstance, data: &ViewData) -> Result<(), ViewError> {
        if let Some(view) = instance.view() {
            view.initialize(data).await;
        }
        if let Some(animation) = instance.animation().filter(|a| a.is_enabled()) {
            animation.play_show(instance.node()).await?;
        }
        if let Some(view) = instance.view() {
            view.on_opened().await;
        }
        Ok(())
    }

    async fn run_close(
        &self,
        config: &ViewConfig,
        instance: &ViewInstance,
        force_destroy: bool,
    ) -> Result<(), ViewError> {
        let recorded = self
            .active
            .read()
            .get(&config.id)
            .map(|entry| (entry.instance.clone(), entry.residency));
        let Some((current, residency)) = recorded else {
            debug!(view = %config.id, "Close of view that is not open ignored");
            return Ok(());
        };
        if current != *instance {
            debug!(
                view = %config.id,
                given = %instance.node_id(),
                active = %current.node_id(),
                "Close handle is not the active instance, closing the active one"
            );
        }

        if residency == Residency::Cached {
            if force_destroy {
                self.retire(&config.id, &current).await;
            }
            return Ok(());
        }

        if let Some(animation) = current.animation().filter(|a| a.is_enabled()) {
            animation.play_hide(current.node()).await?;
        }
        if let Some(view) = current.view() {
            view.on_closed().await;
        }

        if force_destroy || !config.cache_on_close {
            self.retire(&config.id, &current).await;
        } else {
            current.node().set_active(false);
            if let Some(entry) = self.active.write().get_mut(&config.id) {
                if entry.instance == current {
                    entry.residency = Residency::Cached;
                }
            }
            info!(view = %config.id, node = %current.node_id(), "View closed and cached");
        }
        Ok(())
    }

    async fn retire(&self, id: &str, instance: &ViewInstance) {
        self.forget(id, instance);
        instance.destroy().await;
        info!(view = %id, node = %instance.node_id(), "View destroyed");
    }

    fn forget(&self, id: &str, instance: &ViewInstance) {
        let mut active = self.active.write();
        if active.get(id).is_some_and(|entry| entry.instance == *instance) {
            active.remove(id);
        }
    }
}
