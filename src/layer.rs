//! Layer Registry
//!
//! Fixed, ordered set of named containers that view instances attach to. The
//! containers are built once under a single root node and sized to the viewport.

use crate::error::LayerError;
use crate::scene::{SceneNode, Size};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Layer identifiers, in draw order (lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    Background = 0,
    Normal = 1,
    Popup = 2,
    Dialog = 3,
    Toast = 4,
    Loading = 5,
    Top = 10,
}

impl LayerId {
    pub const ALL: [LayerId; 7] = [
        LayerId::Background,
        LayerId::Normal,
        LayerId::Popup,
        LayerId::Dialog,
        LayerId::Toast,
        LayerId::Loading,
        LayerId::Top,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerId::Background => "background",
            LayerId::Normal => "normal",
            LayerId::Popup => "popup",
            LayerId::Dialog => "dialog",
            LayerId::Toast => "toast",
            LayerId::Loading => "loading",
            LayerId::Top => "top",
        }
    }

    pub fn z_index(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LayerId {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerId::ALL
            .into_iter()
            .find(|layer| layer.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LayerError::LayerNotFound(s.to_string()))
    }
}

struct LayerSet {
    root: Arc<SceneNode>,
    containers: BTreeMap<LayerId, Arc<SceneNode>>,
}

/// Layer containers keyed by [`LayerId`]
pub struct LayerRegistry {
    layers: RwLock<Option<LayerSet>>,
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self {
            layers: RwLock::new(None),
        }
    }

    /// Build one container per layer under `root`. Calling this again tears down
    /// the previous containers and rebuilds them.
    pub fn initialize(&self, root: &Arc<SceneNode>, viewport: Size, layers: &[LayerId]) {
        let mut guard = self.layers.write();
        if let Some(previous) = guard.take() {
            for container in previous.containers.values() {
                container.destroy();
            }
        }

        let mut ordered: Vec<LayerId> = layers.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut containers = BTreeMap::new();
        for layer in ordered {
            let container = SceneNode::new(layer.as_str());
            container.set_size(viewport);
            root.insert_child_ordered(&container, layer.z_index());
            containers.insert(layer, container);
        }

        debug!(
            layers = containers.len(),
            width = viewport.width,
            height = viewport.height,
            "Layer registry initialized"
        );

        *guard = Some(LayerSet {
            root: Arc::clone(root),
            containers,
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.layers.read().is_some()
    }

    pub fn root(&self) -> Result<Arc<SceneNode>, LayerError> {
        self.layers
            .read()
            .as_ref()
            .map(|set| Arc::clone(&set.root))
            .ok_or(LayerError::NotInitialized)
    }

    /// Container node for `layer`.
    pub fn get(&self, layer: LayerId) -> Result<Arc<SceneNode>, LayerError> {
        let guard = self.layers.read();
        let set = guard.as_ref().ok_or(LayerError::NotInitialized)?;
        set.containers
            .get(&layer)
            .cloned()
            .ok_or_else(|| LayerError::LayerNotFound(layer.to_string()))
    }

    /// Parent `node` under the container for `layer`, ordered by `priority`.
    pub fn attach(
        &self,
        layer: LayerId,
        node: &Arc<SceneNode>,
        priority: i32,
    ) -> Result<Arc<SceneNode>, LayerError> {
        let container = self.get(layer)?;
        container.insert_child_ordered(node, priority);
        Ok(container)
    }

    pub fn layers(&self) -> Vec<LayerId> {
        self.layers
            .read()
            .as_ref()
            .map(|set| set.containers.keys().copied().collect())
            .unwrap_or_default()
    }
}
