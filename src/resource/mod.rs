//! Resource Loading
//!
//! Asset transport seam, single-flight loader, asset cache, and the
//! [`ResourceManager`] facade that composes them behind one "load, optionally
//! cached" call.

pub mod asset;
pub mod cache;
pub mod loader;
pub mod transport;

pub use asset::{Asset, AssetData, AssetKind, Blueprint, Template};
pub use cache::AssetCache;
pub use loader::AssetLoader;
pub use transport::{AssetTransport, MemoryTransport};

use crate::error::{LoadCause, LoadError};
use std::sync::Arc;
use tracing::{debug, error};

pub struct ResourceManager {
    loader: Arc<AssetLoader>,
    cache: Arc<AssetCache>,
}

impl ResourceManager {
    pub fn new(loader: Arc<AssetLoader>, cache: Arc<AssetCache>) -> Self {
        Self { loader, cache }
    }

    /// Build a loader and cache over one transport.
    pub fn with_transport(transport: Arc<dyn AssetTransport>) -> Self {
        Self::new(
            Arc::new(AssetLoader::new(Arc::clone(&transport))),
            Arc::new(AssetCache::new(transport)),
        )
    }

    pub fn loader(&self) -> &Arc<AssetLoader> {
        &self.loader
    }

    pub fn cache(&self) -> &Arc<AssetCache> {
        &self.cache
    }

    /// Load `path`. With `use_cache`, a cached asset is returned without a
    /// transport request and a successful load is cached before it is returned.
    pub async fn load_async(
        &self,
        path: &str,
        kind: AssetKind,
        use_cache: bool,
    ) -> Result<Asset, LoadError> {
        if use_cache {
            if let Some(asset) = self.cache.get(path) {
                debug!(path, "Serving asset from cache");
                return Ok(asset);
            }
        }

        let asset = self.loader.load_async(path, kind).await?;
        if use_cache {
            self.cache.set(path, asset.clone());
        }
        Ok(asset)
    }

    /// Callback form of [`ResourceManager::load_async`]. A cache hit invokes
    /// `callback` before this returns.
    pub fn load<F>(&self, path: &str, kind: AssetKind, use_cache: bool, callback: F)
    where
        F: FnOnce(Result<Asset, LoadError>) + Send + 'static,
    {
        if use_cache {
            if let Some(asset) = self.cache.get(path) {
                debug!(path, "Serving asset from cache");
                callback(Ok(asset));
                return;
            }
        }

        let cache = Arc::clone(&self.cache);
        let key = path.to_string();
        self.loader.load(path, kind, move |result| {
            if let (true, Ok(asset)) = (use_cache, &result) {
                cache.set(&key, asset.clone());
            }
            callback(result);
        });
    }

    /// Load a template asset, rejecting any other payload kind. The template
    /// key must equal `path`; pooled instances are filed under that key.
    pub async fn load_template(
        &self,
        path: &str,
        use_cache: bool,
    ) -> Result<Arc<Template>, LoadError> {
        let asset = self.load_async(path, AssetKind::Template, use_cache).await?;
        let template = asset.as_template().cloned().ok_or_else(|| {
            LoadError::new(
                path,
                LoadCause::KindMismatch {
                    expected: AssetKind::Template.to_string(),
                    actual: asset.kind().to_string(),
                },
            )
        })?;
        if template.key() != path {
            error!(path, key = template.key(), "Template key does not match its load path");
            return Err(LoadError::new(
                path,
                LoadCause::KeyMismatch {
                    actual: template.key().to_string(),
                },
            ));
        }
        Ok(template)
    }

    pub fn cached(&self, path: &str) -> Option<Asset> {
        self.cache.get(path)
    }

    pub fn remove_cached(&self, path: &str) -> bool {
        self.cache.remove(path)
    }

    /// Drop every cached asset (bulk teardown).
    pub fn clear(&self) {
        self.cache.clear();
    }
}
