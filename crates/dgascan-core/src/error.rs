//! Error types for dgascan.

use thiserror::Error;

/// Result type alias for dgascan operations.
pub type Result<T> = std::result::Result<T, DgaError>;

/// Errors that can occur while loading a model or predicting.
#[derive(Error, Debug)]
pub enum DgaError {
    /// Prediction requested before a model was loaded.
    #[error("model not loaded")]
    ModelNotLoaded,

    /// The model's forward pass failed.
    #[error("model inference failed: {source}")]
    ModelInference {
        /// Underlying failure reported by the model.
        #[source]
        source: Box<DgaError>,
    },

    /// Domain rejected by the syntax check at an input boundary.
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// Model artifact could not be loaded.
    #[error("model error: {0}")]
    ModelError(String),

    /// Shape mismatch error.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// I/O error.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Candle tensor error.
    #[error("tensor error: {0}")]
    TensorError(#[from] candle_core::Error),
}

impl DgaError {
    /// Wrap a model failure as an inference error, preserving the cause.
    ///
    /// Errors that already are inference errors are returned unchanged.
    pub fn inference(cause: DgaError) -> Self {
        match cause {
            DgaError::ModelInference { .. } => cause,
            other => DgaError::ModelInference {
                source: Box::new(other),
            },
        }
    }

    /// Whether this error came out of the model's computation step.
    pub fn is_inference(&self) -> bool {
        matches!(self, DgaError::ModelInference { .. })
    }
}
