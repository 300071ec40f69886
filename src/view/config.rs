//! View configuration: one immutable record per view id.

use crate::error::ViewError;
use crate::layer::LayerId;
use serde::{Deserialize, Serialize};

/// Static description of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Unique view identifier
    pub id: String,

    /// Template asset path used to construct the view
    pub template_path: String,

    /// Layer the view is attached to
    pub layer: LayerId,

    /// Keep the instance attached and hidden on close instead of destroying it
    #[serde(default)]
    pub cache_on_close: bool,

    /// Sibling order within the layer (higher draws above lower)
    #[serde(default)]
    pub priority: i32,
}

impl ViewConfig {
    pub fn new(id: impl Into<String>, template_path: impl Into<String>, layer: LayerId) -> Self {
        Self {
            id: id.into(),
            template_path: template_path.into(),
            layer,
            cache_on_close: false,
            priority: 0,
        }
    }

    pub fn cache_on_close(mut self, cache: bool) -> Self {
        self.cache_on_close = cache;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn validate(&self) -> Result<(), ViewError> {
        if self.id.trim().is_empty() {
            return Err(ViewError::InvalidConfig("view id cannot be empty".to_string()));
        }
        if self.template_path.trim().is_empty() {
            return Err(ViewError::InvalidConfig(format!(
                "view '{}' has no template path",
                self.id
            )));
        }
        Ok(())
    }
}
