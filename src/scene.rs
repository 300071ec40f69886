//! Scene Nodes
//!
//! Minimal in-process object graph node. Stands in for the engine's scene graph:
//! the orchestrator only needs parenting, sibling order, an active flag and a
//! destroyed flag that makes stale handles detectable.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Unique node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        NodeId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Width and height in viewport units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Default)]
struct NodeState {
    active: bool,
    destroyed: bool,
    size: Size,
    order: i32,
    parent: Option<Weak<SceneNode>>,
    children: Vec<Arc<SceneNode>>,
}

#[derive(Debug)]
pub struct SceneNode {
    id: NodeId,
    name: String,
    state: RwLock<NodeState>,
}

impl SceneNode {
    /// Create a detached, active node.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::next(),
            name: name.into(),
            state: RwLock::new(NodeState {
                active: true,
                ..NodeState::default()
            }),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        let state = self.state.read();
        state.active && !state.destroyed
    }

    pub fn set_active(&self, active: bool) {
        self.state.write().active = active;
    }

    /// False once the node has been destroyed.
    pub fn is_valid(&self) -> bool {
        !self.state.read().destroyed
    }

    pub fn size(&self) -> Size {
        self.state.read().size
    }

    pub fn set_size(&self, size: Size) {
        self.state.write().size = size;
    }

    /// Sibling ordering key used by [`SceneNode::insert_child_ordered`].
    pub fn order(&self) -> i32 {
        self.state.read().order
    }

    pub fn parent(&self) -> Option<Arc<SceneNode>> {
        self.state.read().parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn children(&self) -> Vec<Arc<SceneNode>> {
        self.state.read().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.state.read().children.len()
    }

    pub fn has_child(&self, child: &SceneNode) -> bool {
        self.state.read().children.iter().any(|c| c.id == child.id)
    }

    /// Append `child` as the last child, detaching it from any previous parent.
    pub fn add_child(self: &Arc<Self>, child: &Arc<SceneNode>) {
        child.remove_from_parent();
        self.state.write().children.push(Arc::clone(child));
        child.state.write().parent = Some(Arc::downgrade(self));
    }

    /// Insert `child` after every sibling whose order is <= `order`.
    pub fn insert_child_ordered(self: &Arc<Self>, child: &Arc<SceneNode>, order: i32) {
        child.remove_from_parent();
        child.state.write().order = order;
        {
            let mut state = self.state.write();
            let index = state
                .children
                .iter()
                .position(|c| c.order() > order)
                .unwrap_or(state.children.len());
            state.children.insert(index, Arc::clone(child));
        }
        child.state.write().parent = Some(Arc::downgrade(self));
    }

    pub fn remove_from_parent(&self) {
        let parent = self.state.write().parent.take();
        if let Some(parent) = parent.and_then(|p| p.upgrade()) {
            parent.state.write().children.retain(|c| c.id != self.id);
        }
    }

    /// Detach and destroy this node and its whole subtree. Idempotent.
    pub fn destroy(&self) {
        if !self.is_valid() {
            return;
        }
        self.remove_from_parent();
        let children = {
            let mut state = self.state.write();
            state.destroyed = true;
            state.active = false;
            std::mem::take(&mut state.children)
        };
        for child in children {
            child.state.write().parent = None;
            child.destroy();
        }
    }
}
