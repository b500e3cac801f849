//! Custom error types for Ensemble
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Ensemble operations
#[derive(Error, Debug)]
pub enum EnsembleError {
    /// A required agent parameter was absent at execution time
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// Selection produced a name with no registry entry
    #[error("Agent '{0}' is not registered in the network")]
    AgentNotRegistered(String),

    /// Selection produced no agent names at all
    #[error("No applicable agents found for the prompt")]
    NoApplicableAgents,

    /// Model backend or API errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Model not available on the backend
    #[error("Model '{0}' not available. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Config file IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for Ensemble operations
pub type Result<T> = std::result::Result<T, EnsembleError>;

impl EnsembleError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
