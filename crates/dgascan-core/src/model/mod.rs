//! Model loading and inference.
//!
//! Provides the model abstraction the prediction pipeline runs against:
//! - [`DgaModel`] - Trait for anything that maps an input tensor to a probability tensor
//! - [`LstmClassifier`] - The character-level LSTM classifier
//! - [`FixedModel`] - Constant-output reference model
//! - [`WeightLoader`] - SafeTensors weight loading

mod config;
mod fixed;
mod loader;
pub mod lstm;

pub use config::{ModelConfig, DEFAULT_MODEL_ID};
pub use fixed::FixedModel;
pub use loader::WeightLoader;
pub use lstm::{LstmClassifier, LstmWeights};

use crate::error::Result;
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use std::path::Path;
use std::sync::Arc;

/// A loaded, read-only classification model.
///
/// Implementations are shared across concurrent predictions and must not
/// mutate themselves in `predict`.
#[async_trait]
pub trait DgaModel: Send + Sync {
    /// Identifier reported with predictions.
    fn id(&self) -> &str;

    /// Device input tensors should be built on.
    fn device(&self) -> Device {
        Device::Cpu
    }

    /// Run the model on a `[1, 45]` token tensor.
    ///
    /// The first element of the returned tensor is the probability that the
    /// domain is algorithmically generated.
    async fn predict(&self, input: &Tensor) -> Result<Tensor>;
}

/// Shared handle to a loaded model.
pub type ModelHandle = Arc<dyn DgaModel>;

/// Load the LSTM classifier from a model directory onto the CPU.
pub fn load_model(dir: impl AsRef<Path>) -> Result<ModelHandle> {
    let dir = dir.as_ref();
    let model = LstmClassifier::load(dir, &Device::Cpu)?;
    tracing::info!(dir = %dir.display(), model_id = model.id(), "model loaded");
    Ok(Arc::new(model))
}
