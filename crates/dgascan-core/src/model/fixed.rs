//! Fixed-output reference model.

use super::DgaModel;
use crate::error::{DgaError, Result};
use crate::vocab::MAX_DOMAIN_LEN;
use async_trait::async_trait;
use candle_core::Tensor;

/// Model that answers every well-formed input with the same probability.
///
/// Checks the input shape like a real model would, which makes it useful
/// for exercising hosts and adapters without model files.
///
/// # Example
///
/// ```rust
/// use dgascan_core::model::FixedModel;
///
/// let model = FixedModel::new(0.95);
/// assert_eq!(model.probability(), 0.95);
/// ```
#[derive(Debug, Clone)]
pub struct FixedModel {
    id: String,
    probability: f32,
}

impl FixedModel {
    /// Create a model that always returns `probability`.
    pub fn new(probability: f32) -> Self {
        Self {
            id: "fixed".to_string(),
            probability,
        }
    }

    /// Override the reported model id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Probability returned for every input.
    pub fn probability(&self) -> f32 {
        self.probability
    }
}

#[async_trait]
impl DgaModel for FixedModel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn predict(&self, input: &Tensor) -> Result<Tensor> {
        if input.dims() != [1, MAX_DOMAIN_LEN] {
            return Err(DgaError::ShapeMismatch(format!(
                "input: expected [1, {}], got {:?}",
                MAX_DOMAIN_LEN,
                input.dims()
            )));
        }
        Ok(Tensor::new(&[[self.probability]], input.device())?)
    }
}
