//! View Instances
//!
//! A view instance is a constructed template: a scene node plus the optional
//! capabilities the template attached to it (lifecycle hooks, animation port,
//! pool hooks). Handles are cheap to clone and compare by identity.

mod config;

pub use config::ViewConfig;

use crate::animation::AnimationPort;
use crate::pool::Poolable;
use crate::scene::{NodeId, SceneNode};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

/// Data passed to [`ViewContract::initialize`] on every open.
pub type ViewData = serde_json::Value;

/// Lifecycle hooks every view may implement. All hooks default to no-ops.
#[async_trait]
pub trait ViewContract: Send + Sync {
    /// Called on every open (fresh or reactivated) before the show animation.
    async fn initialize(&self, _data: &ViewData) {}

    /// Called after the show animation settles.
    async fn on_opened(&self) {}

    /// Called after the hide animation settles.
    async fn on_closed(&self) {}

    /// Called right before the instance is destroyed.
    async fn on_cleanup(&self) {}
}

/// Capabilities a template attaches to each instance it builds.
#[derive(Clone, Default)]
pub struct ViewParts {
    pub view: Option<Arc<dyn ViewContract>>,
    pub animation: Option<Arc<dyn AnimationPort>>,
    pub poolable: Option<Arc<dyn Poolable>>,
}

impl ViewParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(mut self, view: Arc<dyn ViewContract>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_animation(mut self, animation: Arc<dyn AnimationPort>) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn with_poolable(mut self, poolable: Arc<dyn Poolable>) -> Self {
        self.poolable = Some(poolable);
        self
    }
}

struct InstanceInner {
    node: Arc<SceneNode>,
    template_key: String,
    parts: ViewParts,
    view_id: RwLock<Option<String>>,
}

/// Handle to a constructed view.
#[derive(Clone)]
pub struct ViewInstance {
    inner: Arc<InstanceInner>,
}

impl ViewInstance {
    pub fn new(template_key: impl Into<String>, node: Arc<SceneNode>, parts: ViewParts) -> Self {
        Self {
            inner: Arc::new(InstanceInner {
                node,
                template_key: template_key.into(),
                parts,
                view_id: RwLock::new(None),
            }),
        }
    }

    pub fn node(&self) -> &Arc<SceneNode> {
        &self.inner.node
    }

    pub fn node_id(&self) -> NodeId {
        self.inner.node.id()
    }

    pub fn template_key(&self) -> &str {
        &self.inner.template_key
    }

    pub fn view(&self) -> Option<&Arc<dyn ViewContract>> {
        self.inner.parts.view.as_ref()
    }

    pub fn animation(&self) -> Option<&Arc<dyn AnimationPort>> {
        self.inner.parts.animation.as_ref()
    }

    pub fn poolable(&self) -> Option<&Arc<dyn Poolable>> {
        self.inner.parts.poolable.as_ref()
    }

    /// Id of the view config this instance currently serves, if any.
    pub fn view_id(&self) -> Option<String> {
        self.inner.view_id.read().clone()
    }

    pub(crate) fn tag(&self, view_id: &str) {
        *self.inner.view_id.write() = Some(view_id.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.inner.node.is_valid()
    }

    pub fn is_active(&self) -> bool {
        self.inner.node.is_active()
    }

    /// Stop any animation, run the cleanup hook, then detach and destroy the node.
    pub(crate) async fn destroy(&self) {
        if let Some(animation) = self.animation() {
            animation.stop();
        }
        if let Some(view) = self.view() {
            view.on_cleanup().await;
        }
        self.inner.node.destroy();
    }
}

impl PartialEq for ViewInstance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ViewInstance {}

impl std::fmt::Debug for ViewInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewInstance")
            .field("node", &self.inner.node.id())
            .field("template", &self.inner.template_key)
            .field("view_id", &*self.inner.view_id.read())
            .field("valid", &self.is_valid())
            .field("active", &self.is_active())
            .finish()
    }
}
