//! View Directory
//!
//! Caller-facing facade: a registry of view configs plus a second single-flight
//! tier keyed by view id. The directory remembers the handle it returned for
//! each open view; reopening an open view still runs the workflow (so the view
//! replays its initialize and show) but hands back the remembered handle.

use crate::error::ViewError;
use crate::layer::LayerId;
use crate::singleflight::SingleFlight;
use crate::view::{ViewConfig, ViewData, ViewInstance};
use crate::workflow::{ViewState, ViewWorkflow};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Instances created per executor turn by [`ViewDirectory::prewarm`]
pub const DEFAULT_PREWARM_BATCH: usize = 5;

/// One row of [`ViewDirectory::snapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewStatus {
    pub id: String,
    pub layer: LayerId,
    pub state: ViewState,
    pub priority: i32,
    pub cache_on_close: bool,
}

pub struct ViewDirectory {
    workflow: Arc<ViewWorkflow>,
    configs: RwLock<HashMap<String, ViewConfig>>,
    opened: RwLock<HashMap<String, ViewInstance>>,
    opening: SingleFlight<ViewInstance>,
    closing: SingleFlight<()>,
    prewarm_batch: usize,
}

impl ViewDirectory {
    pub fn new(workflow: Arc<ViewWorkflow>) -> Self {
        Self {
            workflow,
            configs: RwLock::new(HashMap::new()),
            opened: RwLock::new(HashMap::new()),
            opening: SingleFlight::new("directory-open"),
            closing: SingleFlight::new("directory-close"),
            prewarm_batch: DEFAULT_PREWARM_BATCH,
        }
    }

    pub fn with_prewarm_batch(mut self, batch: usize) -> Self {
        self.prewarm_batch = batch.max(1);
        self
    }

    pub fn workflow(&self) -> &Arc<ViewWorkflow> {
        &self.workflow
    }

    /// Register `config`. The first registration for an id wins; returns
    /// whether this one was stored.
    pub fn register(&self, config: ViewConfig) -> Result<bool, ViewError> {
        config.validate()?;
        let mut configs = self.configs.write();
        if configs.contains_key(&config.id) {
            debug!(view = %config.id, "View already registered, keeping first config");
            return Ok(false);
        }
        debug!(view = %config.id, layer = %config.layer, "Registered view");
        configs.insert(config.id.clone(), config);
        Ok(true)
    }

    pub fn config(&self, id: &str) -> Option<ViewConfig> {
        self.configs.read().get(id).cloned()
    }

    /// Registered ids, sorted.
    pub fn registered(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.configs.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.opened.read().contains_key(id) && self.workflow.state(id) == ViewState::Open
    }

    /// Handle the directory last handed out for `id`, open or cached.
    pub fn instance(&self, id: &str) -> Option<ViewInstance> {
        self.opened.read().get(id).cloned()
    }

    /// Open a view, registering `config` if its id is new. An id that is
    /// already registered opens with its registered config.
    pub async fn open(&self, config: ViewConfig, data: ViewData) -> Result<ViewInstance, ViewError> {
        let id = config.id.clone();
        self.register(config)?;
        self.open_registered(&id, data).await
    }

    pub async fn open_registered(&self, id: &str, data: ViewData) -> Result<ViewInstance, ViewError> {
        let config = self.require(id)?;

        loop {
            if !self.opening.is_in_flight(id) {
                if let Some(settled) = self.closing.settled(id) {
                    let _ = settled.await;
                    continue;
                }
            }
            return self
                .opening
                .run(id, || self.run_open(&config, data))
                .await;
        }
    }

    /// Close `id`. Unknown or untracked ids are a no-op. Force-destroying a
    /// cached view runs only `on_cleanup`, see [`ViewWorkflow::close`].
    pub async fn close(&self, id: &str, force_destroy: bool) -> Result<(), ViewError> {
        let Some(config) = self.config(id) else {
            debug!(view = id, "Close of unregistered view ignored");
            return Ok(());
        };

        loop {
            if !self.closing.is_in_flight(id) {
                if let Some(settled) = self.opening.settled(id) {
                    let _ = settled.await;
                    continue;
                }
            }
            return self
                .closing
                .run(id, || self.run_close(&config, force_destroy))
                .await;
        }
    }

    /// Close every tracked view in id order. Every view is attempted; the first
    /// failure is returned.
    pub async fn close_all(&self, force_destroy: bool) -> Result<usize, ViewError> {
        let mut ids: Vec<String> = self.opened.read().keys().cloned().collect();
        ids.sort();

        let mut closed = 0;
        let mut first_error = None;
        for id in &ids {
            match self.close(id, force_destroy).await {
                Ok(()) => closed += 1,
                Err(err) => {
                    warn!(view = %id, error = %err, "Close failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        info!(closed, total = ids.len(), force_destroy, "Closed all views");
        match first_error {
            Some(err) => Err(err),
            None => Ok(closed),
        }
    }

    /// Load the template of registered view `id` and fill its pool free list
    /// with up to `count` inactive instances.
    pub async fn prewarm(&self, id: &str, count: usize) -> Result<usize, ViewError> {
        let config = self.require(id)?;
        let template = self
            .workflow
            .resources()
            .load_template(&config.template_path, self.workflow.caches_templates())
            .await?;
        let created = self
            .workflow
            .pool()
            .prewarm_staged(&template, count, self.prewarm_batch)
            .await;
        info!(view = id, template = %config.template_path, created, "Prewarmed view");
        Ok(created)
    }

    /// Status of every registered view, sorted by id.
    pub fn snapshot(&self) -> Vec<ViewStatus> {
        let mut rows: Vec<ViewStatus> = self
            .configs
            .read()
            .values()
            .map(|config| ViewStatus {
                id: config.id.clone(),
                layer: config.layer,
                state: self.workflow.state(&config.id),
                priority: config.priority,
                cache_on_close: config.cache_on_close,
            })
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }

    fn require(&self, id: &str) -> Result<ViewConfig, ViewError> {
        self.config(id)
            .ok_or_else(|| ViewError::InvalidConfig(format!("view '{id}' is not registered")))
    }

    async fn run_open(&self, config: &ViewConfig, data: ViewData) -> Result<ViewInstance, ViewError> {
        let instance = self.workflow.open(config, data).await?;

        let mut opened = self.opened.write();
        match opened.get(&config.id) {
            Some(tracked) if tracked.is_valid() => {
                debug!(view = %config.id, "View already tracked, returning tracked handle");
                Ok(tracked.clone())
            }
            _ => {
                opened.insert(config.id.clone(), instance.clone());
                Ok(instance)
            }
        }
    }

    async fn run_close(&self, config: &ViewConfig, force_destroy: bool) -> Result<(), ViewError> {
        let Some(instance) = self.instance(&config.id) else {
            debug!(view = %config.id, "Close of untracked view ignored");
            return Ok(());
        };

        self.workflow.close(config, &instance, force_destroy).await?;
        if force_destroy || !config.cache_on_close {
            self.opened.write().remove(&config.id);
        }
        Ok(())
    }
}
