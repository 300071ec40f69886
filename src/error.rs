//! Error types for the view lifecycle orchestrator.
//!
//! Every error here is `Clone`: a single open, close or load result fans out to
//! all callers that joined the same flight.

use thiserror::Error;

/// Why an asset load failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadCause {
    #[error("asset path is empty")]
    MissingPath,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("load cancelled")]
    Cancelled,

    #[error("expected a {expected} asset, transport returned {actual}")]
    KindMismatch { expected: String, actual: String },

    #[error("template is keyed '{actual}', not its load path")]
    KeyMismatch { actual: String },
}

/// Asset load failure, tagged with the requested path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to load '{path}': {cause}")]
pub struct LoadError {
    pub path: String,
    pub cause: LoadCause,
}

impl LoadError {
    pub fn new(path: impl Into<String>, cause: LoadCause) -> Self {
        Self {
            path: path.into(),
            cause,
        }
    }
}

/// Failure reported by an asset transport for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Instance pool errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Invalid instance: node {node_id} for template '{template}' is already destroyed")]
    InvalidInstance { template: String, node_id: u64 },

    #[error("Node {node_id} is already pooled under template '{template}'")]
    AlreadyPooled { template: String, node_id: u64 },
}

/// Layer registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("Layer registry is not initialized; call initialize(root) first")]
    NotInitialized,

    #[error("Layer not found: {0}")]
    LayerNotFound(String),
}

/// Animation port errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("Animation already playing on node {node_id}")]
    AnimationBusy { node_id: u64 },

    #[error("Animation cancelled")]
    Cancelled,
}

/// Orchestrator errors surfaced by the workflow and the directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("Invalid view config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Animation(#[from] AnimationError),

    #[error("View '{0}' flight was abandoned before it settled")]
    Abandoned(String),

    #[error("View runtime has been shut down")]
    ShutDown,
}

impl ViewError {
    /// Whether retrying the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ViewError::Load(_) | ViewError::Animation(_) | ViewError::Abandoned(_)
        )
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(String),

    #[error("Configuration validation failed:\n{0}")]
    Invalid(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Errors surfaced by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("Invalid script: {0}")]
    Script(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}
