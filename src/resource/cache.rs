//! Asset Cache
//!
//! Path to asset memo. Last writer wins; removing an entry hands the asset
//! back to its owning transport.

use crate::resource::asset::Asset;
use crate::resource::transport::AssetTransport;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AssetCache {
    entries: RwLock<HashMap<String, Asset>>,
    owner: Arc<dyn AssetTransport>,
}

impl AssetCache {
    pub fn new(owner: Arc<dyn AssetTransport>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            owner,
        }
    }

    pub fn get(&self, path: &str) -> Option<Asset> {
        if path.is_empty() {
            warn!("Asset cache lookup with empty path");
            return None;
        }
        self.entries.read().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.read().contains_key(path)
    }

    /// Store `asset` under `path`, replacing any previous entry without releasing it.
    pub fn set(&self, path: &str, asset: Asset) {
        if path.is_empty() {
            warn!("Refusing to cache asset under empty path");
            return;
        }
        self.entries.write().insert(path.to_string(), asset);
    }

    /// Remove the entry and release it to the owner. False when absent.
    pub fn remove(&self, path: &str) -> bool {
        if path.is_empty() {
            warn!("Asset cache remove with empty path");
            return false;
        }
        let removed = self.entries.write().remove(path);
        match removed {
            Some(asset) => {
                self.owner.release(&asset);
                debug!(path, "Released cached asset");
                true
            }
            None => false,
        }
    }

    /// Drop every entry. No release signals are sent.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        debug!(entries = entries.len(), "Clearing asset cache");
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
