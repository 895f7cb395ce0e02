//! Error types for the oscillator simulation

use thiserror::Error;

/// Result type for Kuramoto operations
pub type KuramotoResult<T> = Result<T, KuramotoError>;

/// Errors that can occur while configuring, running or exporting a simulation
#[derive(Error, Debug)]
pub enum KuramotoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}
