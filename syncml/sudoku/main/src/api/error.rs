//! Error types for the Sudoku model

use syncml_core::TensorError;
use syncml_nn::NnError;
use thiserror::Error;

/// Result type for Sudoku operations
pub type SudokuResult<T> = Result<T, SudokuError>;

/// Errors from board parsing, model construction, inference and weight I/O
#[derive(Error, Debug)]
pub enum SudokuError {
    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),

    #[error("Layer error: {0}")]
    Nn(#[from] NnError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Safetensors error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    #[error("Invalid board: {0}")]
    InvalidBoard(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Weight error: {0}")]
    Weights(String),
}
