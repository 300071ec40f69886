//! Instance Pool
//!
//! Per-template bounded free lists of constructed but inactive view instances.
//! An instance is either handed out, queued in exactly one free list, or
//! destroyed. Free lists never grow past their cap; surplus releases are
//! destroyed on the spot.

use crate::error::PoolError;
use crate::resource::Template;
use crate::view::ViewInstance;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, info, warn};

/// Default free-list cap per template
pub const DEFAULT_MAX_POOL_SIZE: usize = 50;

/// Optional spawn/recycle hooks for pooled instances.
pub trait Poolable: Send + Sync {
    /// Called every time the instance is handed out.
    fn on_spawn(&self) {}

    /// Called when the instance is returned to the pool.
    fn on_recycle(&self) {}
}

/// What happened to a released instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    Pooled,
    Destroyed,
}

/// Free-list sizes per template key
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolStats {
    pub free: BTreeMap<String, usize>,
    pub created: u64,
    pub reused: u64,
    pub destroyed: u64,
}

struct PoolEntry {
    free: VecDeque<ViewInstance>,
}

pub struct InstancePool {
    entries: RwLock<HashMap<String, PoolEntry>>,
    max_pool_size: RwLock<usize>,
    caps: RwLock<HashMap<String, usize>>,
    stats: RwLock<PoolStats>,
}

impl Default for InstancePool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POOL_SIZE)
    }
}

impl InstancePool {
    pub fn new(max_pool_size: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_pool_size: RwLock::new(max_pool_size),
            caps: RwLock::new(HashMap::new()),
            stats: RwLock::new(PoolStats::default()),
        }
    }

    pub fn set_max_pool_size(&self, size: usize) {
        *self.max_pool_size.write() = size;
    }

    /// Override the cap for one template key.
    pub fn set_cap(&self, template_key: impl Into<String>, cap: usize) {
        self.caps.write().insert(template_key.into(), cap);
    }

    pub fn cap(&self, template_key: &str) -> usize {
        self.caps
            .read()
            .get(template_key)
            .copied()
            .unwrap_or(*self.max_pool_size.read())
    }

    pub fn free_count(&self, template_key: &str) -> usize {
        self.entries
            .read()
            .get(template_key)
            .map(|entry| entry.free.len())
            .unwrap_or(0)
    }

    /// Fill the free list up to `min(count, cap)` inactive instances.
    pub fn prewarm(&self, template: &Template, count: usize) -> usize {
        let target = count.min(self.cap(template.key()));
        let mut created = 0;
        let mut entries = self.entries.write();
        let entry = entries
            .entry(template.key().to_string())
            .or_insert_with(|| PoolEntry {
                free: VecDeque::new(),
            });
        while entry.free.len() < target {
            let instance = template.instantiate();
            instance.node().set_active(false);
            entry.free.push_back(instance);
            created += 1;
        }
        drop(entries);

        if created > 0 {
            self.stats.write().created += created as u64;
            debug!(template = template.key(), created, "Prewarmed pool");
        }
        created
    }

    /// Like [`InstancePool::prewarm`], yielding to the executor after every
    /// `batch` instances so large prewarms do not hog the thread.
    pub async fn prewarm_staged(&self, template: &Template, count: usize, batch: usize) -> usize {
        let target = count.min(self.cap(template.key()));
        let batch = batch.max(1);
        let mut created = 0;
        loop {
            let have = self.free_count(template.key());
            if have >= target {
                break;
            }
            let step = (target - have).min(batch);
            let made = self.prewarm(template, have + step);
            if made == 0 {
                break;
            }
            created += made;
            tokio::task::yield_now().await;
        }
        created
    }

    /// Pop a free instance for `template_key`, if any, and spawn it.
    pub fn try_acquire(&self, template_key: &str) -> Option<ViewInstance> {
        let instance = self
            .entries
            .write()
            .get_mut(template_key)
            .and_then(|entry| entry.free.pop_front())?;
        self.stats.write().reused += 1;
        Some(Self::spawn(instance))
    }

    /// Free instance if available, otherwise a fresh one.
    pub fn acquire(&self, template: &Template) -> ViewInstance {
        if let Some(instance) = self.try_acquire(template.key()) {
            return instance;
        }
        self.stats.write().created += 1;
        debug!(template = template.key(), "Pool empty, instantiating");
        Self::spawn(template.instantiate())
    }

    /// Return `instance` to the pool for `template_key`.
    pub fn release(&self, instance: ViewInstance, template_key: &str) -> Result<Released, PoolError> {
        if !instance.is_valid() {
            warn!(
                template = template_key,
                node = %instance.node_id(),
                "Release of destroyed instance ignored"
            );
            return Err(PoolError::InvalidInstance {
                template: template_key.to_string(),
                node_id: instance.node_id().as_u64(),
            });
        }

        if let Some(pooled_under) = self.pooled_key(&instance) {
            return self.already_pooled(&instance, template_key, pooled_under);
        }

        if let Some(poolable) = instance.poolable() {
            poolable.on_recycle();
        }
        instance.node().remove_from_parent();
        instance.node().set_active(false);

        let cap = self.cap(template_key);
        let mut entries = self.entries.write();
        if let Some(pooled_under) = Self::find_pooled(&entries, &instance) {
            drop(entries);
            return self.already_pooled(&instance, template_key, pooled_under);
        }
        let entry = entries
            .entry(template_key.to_string())
            .or_insert_with(|| PoolEntry {
                free: VecDeque::new(),
            });
        if entry.free.len() < cap {
            entry.free.push_back(instance);
            return Ok(Released::Pooled);
        }
        drop(entries);

        instance.node().destroy();
        self.stats.write().destroyed += 1;
        debug!(template = template_key, cap, "Pool full, destroyed released instance");
        Ok(Released::Destroyed)
    }

    /// Template key whose free list already holds `instance`, if any.
    fn pooled_key(&self, instance: &ViewInstance) -> Option<String> {
        Self::find_pooled(&self.entries.read(), instance)
    }

    fn find_pooled(entries: &HashMap<String, PoolEntry>, instance: &ViewInstance) -> Option<String> {
        entries
            .iter()
            .find(|(_, entry)| entry.free.contains(instance))
            .map(|(key, _)| key.clone())
    }

    /// A second release into the same free list is a no-op; into another one it is rejected.
    fn already_pooled(
        &self,
        instance: &ViewInstance,
        template_key: &str,
        pooled_under: String,
    ) -> Result<Released, PoolError> {
        if pooled_under == template_key {
            debug!(
                template = template_key,
                node = %instance.node_id(),
                "Instance already pooled, release ignored"
            );
            return Ok(Released::Pooled);
        }
        warn!(
            template = template_key,
            pooled_under = %pooled_under,
            node = %instance.node_id(),
            "Release of instance pooled under another template rejected"
        );
        Err(PoolError::AlreadyPooled {
            template: pooled_under,
            node_id: instance.node_id().as_u64(),
        })
    }

    /// Destroy every pooled instance for one template.
    pub fn clear_template(&self, template_key: &str) -> usize {
        let drained = self.entries.write().remove(template_key);
        let count = drained.map(Self::destroy_entry).unwrap_or(0);
        self.stats.write().destroyed += count as u64;
        count
    }

    /// Destroy every pooled instance.
    pub fn clear_all(&self) -> usize {
        let drained: Vec<PoolEntry> = self.entries.write().drain().map(|(_, e)| e).collect();
        let count: usize = drained.into_iter().map(Self::destroy_entry).sum();
        if count > 0 {
            self.stats.write().destroyed += count as u64;
            info!(destroyed = count, "Drained instance pool");
        }
        count
    }

    pub fn stats(&self) -> PoolStats {
        let mut stats = self.stats.read().clone();
        stats.free = self
            .entries
            .read()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.free.len()))
            .collect();
        stats
    }

    fn spawn(instance: ViewInstance) -> ViewInstance {
        instance.node().set_active(true);
        if let Some(poolable) = instance.poolable() {
            poolable.on_spawn();
        }
        instance
    }

    fn destroy_entry(entry: PoolEntry) -> usize {
        let count = entry.free.len();
        for instance in entry.free {
            instance.node().destroy();
        }
        count
    }
}
