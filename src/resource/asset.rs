//! Asset payloads and view templates.

use crate::scene::SceneNode;
use crate::view::{ViewInstance, ViewParts};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of asset requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Template,
    Json,
    Bytes,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Template => "template",
            AssetKind::Json => "json",
            AssetKind::Bytes => "bytes",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the capability set of one instance. Implemented for plain closures.
pub trait Blueprint: Send + Sync {
    fn build(&self) -> ViewParts;
}

impl<F> Blueprint for F
where
    F: Fn() -> ViewParts + Send + Sync,
{
    fn build(&self) -> ViewParts {
        self()
    }
}

/// Blueprint from which view instances are constructed.
pub struct Template {
    key: String,
    blueprint: Arc<dyn Blueprint>,
}

impl Template {
    pub fn new(key: impl Into<String>, blueprint: impl Blueprint + 'static) -> Self {
        Self {
            key: key.into(),
            blueprint: Arc::new(blueprint),
        }
    }

    /// Template with no capabilities attached (plain node).
    pub fn empty(key: impl Into<String>) -> Self {
        Self::new(key, ViewParts::new)
    }

    /// Pool key; the template path it was loaded from.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Construct a fresh, detached, active instance.
    pub fn instantiate(&self) -> ViewInstance {
        let name = self.key.rsplit('/').next().unwrap_or(&self.key);
        let node = SceneNode::new(name);
        ViewInstance::new(self.key.clone(), node, self.blueprint.build())
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template").field("key", &self.key).finish()
    }
}

#[derive(Debug, Clone)]
pub enum AssetData {
    Template(Arc<Template>),
    Json(Arc<serde_json::Value>),
    Bytes(Arc<[u8]>),
}

impl AssetData {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetData::Template(_) => AssetKind::Template,
            AssetData::Json(_) => AssetKind::Json,
            AssetData::Bytes(_) => AssetKind::Bytes,
        }
    }
}

/// Loaded asset. Clones share the same payload.
#[derive(Debug, Clone)]
pub struct Asset {
    path: Arc<str>,
    data: AssetData,
}

impl Asset {
    pub fn new(path: &str, data: AssetData) -> Self {
        Self {
            path: Arc::from(path),
            data,
        }
    }

    pub fn template(path: &str, template: Template) -> Self {
        Self::new(path, AssetData::Template(Arc::new(template)))
    }

    pub fn json(path: &str, value: serde_json::Value) -> Self {
        Self::new(path, AssetData::Json(Arc::new(value)))
    }

    pub fn bytes(path: &str, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(path, AssetData::Bytes(bytes.into()))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> AssetKind {
        self.data.kind()
    }

    pub fn data(&self) -> &AssetData {
        &self.data
    }

    pub fn as_template(&self) -> Option<&Arc<Template>> {
        match &self.data {
            AssetData::Template(template) => Some(template),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match &self.data {
            AssetData::Json(value) => Some(value),
            _ => None,
        }
    }

    /// True when both handles point at the same loaded payload.
    pub fn same_payload(&self, other: &Asset) -> bool {
        match (&self.data, &other.data) {
            (AssetData::Template(a), AssetData::Template(b)) => Arc::ptr_eq(a, b),
            (AssetData::Json(a), AssetData::Json(b)) => Arc::ptr_eq(a, b),
            (AssetData::Bytes(a), AssetData::Bytes(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
