//! viewdeck: Layered View Lifecycle Orchestration
//!
//! Opens and closes views (screens, popups, dialogs, toasts) on a layered
//! scene. Templates are loaded once per concurrent request, instances are
//! pooled and cached, show/hide animations are awaited, and concurrent opens
//! or closes of the same view share one execution.

pub mod animation;
pub mod cli;
pub mod config;
pub mod directory;
pub mod error;
pub mod layer;
pub mod logging;
pub mod pool;
pub mod resource;
pub mod runtime;
pub mod scene;
pub mod singleflight;
pub mod view;
pub mod workflow;

pub use directory::{ViewDirectory, ViewStatus};
pub use error::{AnimationError, ConfigError, LayerError, LoadError, PoolError, ViewError};
pub use layer::LayerId;
pub use runtime::ViewRuntime;
pub use view::{ViewConfig, ViewContract, ViewData, ViewInstance, ViewParts};
pub use workflow::{ViewState, ViewWorkflow};
