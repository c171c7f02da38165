//! Inference Errors
//!
//! Taxonomy lỗi của engine: load model, shape, signal.

use thiserror::Error;

/// Result alias used across the engine
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Errors raised while loading bundles or running inference
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Malformed artifact (bad JSON, missing keys, invalid scaler)
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Input/weight dimensions disagree. Programmer error, never coerced.
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Signal too short for the convolution stack
    #[error("Insufficient signal: need {required} samples, got {actual}")]
    InsufficientSignal { required: usize, actual: usize },

    /// Input value outside what the engine accepts (NaN, empty, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InferenceError {
    pub fn shape(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        InferenceError::ShapeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Load failures may be answered with the analytic fallback.
    /// Shape and signal errors must reach the caller.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            InferenceError::ModelLoad(_) | InferenceError::Io(_) | InferenceError::Json(_)
        )
    }
}
