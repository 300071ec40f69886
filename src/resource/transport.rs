//! Asset transport seam and the in-process memory transport.

use crate::error::TransportError;
use crate::resource::asset::{Asset, AssetData, AssetKind, Template};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Concrete asset loading backend.
///
/// Exactly one completion per request; implementations must not complete
/// re-entrantly from inside the call that issued the request.
#[async_trait]
pub trait AssetTransport: Send + Sync {
    async fn request_load(&self, path: &str, kind: AssetKind) -> Result<Asset, TransportError>;

    /// Return an asset to its owner once the cache drops it.
    fn release(&self, _asset: &Asset) {}
}

/// Transport serving assets registered in memory.
///
/// Counts requests per path and records releases. Paths can be held so that
/// requests stay in flight until [`MemoryTransport::resume`] is called.
#[derive(Default)]
pub struct MemoryTransport {
    assets: RwLock<HashMap<String, AssetData>>,
    failures: RwLock<HashMap<String, String>>,
    gates: RwLock<HashMap<String, Arc<Semaphore>>>,
    requests: RwLock<HashMap<String, usize>>,
    released: RwLock<Vec<String>>,
    latency: Option<Duration>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every request by `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn insert(&self, path: impl Into<String>, data: AssetData) {
        self.assets.write().insert(path.into(), data);
    }

    pub fn insert_template(&self, template: Template) {
        let path = template.key().to_string();
        self.insert(path, AssetData::Template(Arc::new(template)));
    }

    /// Make requests for `path` fail with `message` until cleared.
    pub fn fail(&self, path: impl Into<String>, message: impl Into<String>) {
        self.failures.write().insert(path.into(), message.into());
    }

    pub fn clear_failure(&self, path: &str) {
        self.failures.write().remove(path);
    }

    /// Keep requests for `path` pending until [`MemoryTransport::resume`].
    pub fn hold(&self, path: impl Into<String>) {
        self.gates
            .write()
            .insert(path.into(), Arc::new(Semaphore::new(0)));
    }

    pub fn resume(&self, path: &str) {
        if let Some(gate) = self.gates.write().remove(path) {
            gate.add_permits(1);
        }
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.requests.read().get(path).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.requests.read().values().sum()
    }

    pub fn request_counts(&self) -> HashMap<String, usize> {
        self.requests.read().clone()
    }

    pub fn released(&self) -> Vec<String> {
        self.released.read().clone()
    }
}

#[async_trait]
impl AssetTransport for MemoryTransport {
    async fn request_load(&self, path: &str, _kind: AssetKind) -> Result<Asset, TransportError> {
        *self.requests.write().entry(path.to_string()).or_insert(0) += 1;

        // Never settle inside the issuing poll.
        tokio::task::yield_now().await;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let gate = self.gates.read().get(path).cloned();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|_| TransportError(format!("gate for '{}' closed", path)))?;
        }

        if let Some(message) = self.failures.read().get(path) {
            return Err(TransportError(message.clone()));
        }

        self.assets
            .read()
            .get(path)
            .cloned()
            .map(|data| Asset::new(path, data))
            .ok_or_else(|| TransportError(format!("no asset registered at '{}'", path)))
    }

    fn release(&self, asset: &Asset) {
        self.released.write().push(asset.path().to_string());
    }
}
