//! Character-level LSTM domain classifier.
//!
//! Embedding → single LSTM layer (last hidden state) → dense → sigmoid.
//!
//! # Weights
//!
//! | name                    | shape                  |
//! |-------------------------|------------------------|
//! | `embedding.weight`      | `[vocab, embed]`       |
//! | `lstm.kernel`           | `[embed, 4 * hidden]`  |
//! | `lstm.recurrent_kernel` | `[hidden, 4 * hidden]` |
//! | `lstm.bias`             | `[4 * hidden]`         |
//! | `dense.kernel`          | `[hidden, 1]`          |
//! | `dense.bias`            | `[1]`                  |
//!
//! Gate blocks are stacked in `i, f, c, o` order along the last axis.
//!
//! # Formula
//!
//! ```text
//! i = σ(x W_i + h U_i + b_i)     f = σ(x W_f + h U_f + b_f)
//! g = tanh(x W_c + h U_c + b_c)  o = σ(x W_o + h U_o + b_o)
//! c' = f * c + i * g             h' = o * tanh(c')
//! ```

use super::{DgaModel, ModelConfig, WeightLoader};
use crate::error::{DgaError, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::ops::sigmoid;

/// Embedding table name.
pub const EMBEDDING: &str = "embedding.weight";
/// Input-to-gates kernel name.
pub const LSTM_KERNEL: &str = "lstm.kernel";
/// Hidden-to-gates kernel name.
pub const LSTM_RECURRENT: &str = "lstm.recurrent_kernel";
/// Gate bias name.
pub const LSTM_BIAS: &str = "lstm.bias";
/// Output projection name.
pub const DENSE_KERNEL: &str = "dense.kernel";
/// Output bias name.
pub const DENSE_BIAS: &str = "dense.bias";

/// Trained weights of the classifier.
#[derive(Debug, Clone)]
pub struct LstmWeights {
    /// `[vocab, embed]`
    pub embedding: Tensor,
    /// `[embed, 4 * hidden]`
    pub kernel: Tensor,
    /// `[hidden, 4 * hidden]`
    pub recurrent_kernel: Tensor,
    /// `[4 * hidden]`
    pub bias: Tensor,
    /// `[hidden, 1]`
    pub dense_kernel: Tensor,
    /// `[1]`
    pub dense_bias: Tensor,
}

impl LstmWeights {
    /// Pull every weight out of a loader, checking shapes against `config`.
    pub fn from_loader(config: &ModelConfig, loader: &WeightLoader) -> Result<Self> {
        let (e, h, g) = (config.embedding_dim, config.hidden_size, config.gate_width());
        Ok(Self {
            embedding: loader.get_tensor(EMBEDDING, &[config.vocab_size, e])?,
            kernel: loader.get_tensor(LSTM_KERNEL, &[e, g])?,
            recurrent_kernel: loader.get_tensor(LSTM_RECURRENT, &[h, g])?,
            bias: loader.get_tensor(LSTM_BIAS, &[g])?,
            dense_kernel: loader.get_tensor(DENSE_KERNEL, &[h, 1])?,
            dense_bias: loader.get_tensor(DENSE_BIAS, &[1])?,
        })
    }

    /// Random weights (for testing).
    pub fn random(config: &ModelConfig, device: &Device) -> Result<Self> {
        let (e, h, g) = (config.embedding_dim, config.hidden_size, config.gate_width());
        Ok(Self {
            embedding: Tensor::randn(0.0f32, 0.1, (config.vocab_size, e), device)?,
            kernel: Tensor::randn(0.0f32, 0.1, (e, g), device)?,
            recurrent_kernel: Tensor::randn(0.0f32, 0.1, (h, g), device)?,
            bias: Tensor::zeros(g, DType::F32, device)?,
            dense_kernel: Tensor::randn(0.0f32, 0.1, (h, 1), device)?,
            dense_bias: Tensor::zeros(1, DType::F32, device)?,
        })
    }

    /// All-zero weights with a chosen output bias.
    ///
    /// The hidden state stays zero for every input, so the output is exactly
    /// `sigmoid(output_bias)`.
    pub fn constant(config: &ModelConfig, output_bias: f32, device: &Device) -> Result<Self> {
        let (e, h, g) = (config.embedding_dim, config.hidden_size, config.gate_width());
        Ok(Self {
            embedding: Tensor::zeros((config.vocab_size, e), DType::F32, device)?,
            kernel: Tensor::zeros((e, g), DType::F32, device)?,
            recurrent_kernel: Tensor::zeros((h, g), DType::F32, device)?,
            bias: Tensor::zeros(g, DType::F32, device)?,
            dense_kernel: Tensor::zeros((h, 1), DType::F32, device)?,
            dense_bias: Tensor::new(&[output_bias], device)?,
        })
    }
}

/// LSTM classifier over padded domain token ids.
#[derive(Debug, Clone)]
pub struct LstmClassifier {
    config: ModelConfig,
    weights: LstmWeights,
    device: Device,
}

impl LstmClassifier {
    /// Create a classifier from config and weights.
    pub fn new(config: ModelConfig, weights: LstmWeights, device: Device) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            weights,
            device,
        })
    }

    /// Load `config.json` and the `.safetensors` weights from a model directory.
    pub fn load(dir: &std::path::Path, device: &Device) -> Result<Self> {
        let config = ModelConfig::from_file(&dir.join("config.json"))?;
        let loader = WeightLoader::from_dir(dir, device)?;
        let weights = LstmWeights::from_loader(&config, &loader)?;
        Self::new(config, weights, loader.device().clone())
    }

    /// Get model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// * `input` - Token ids `[1, max_len]`
    ///
    /// # Returns
    ///
    /// Probability of the domain being generated, `[1, 1]`.
    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let expected = [1, self.config.max_len];
        if input.dims() != expected {
            return Err(DgaError::ShapeMismatch(format!(
                "input: expected {:?}, got {:?}",
                expected,
                input.dims()
            )));
        }

        let hidden = self.config.hidden_size;
        let w = &self.weights;

        // [max_len] -> [max_len, embed]
        let ids = input.to_dtype(DType::U32)?.flatten_all()?;
        let embedded = w.embedding.index_select(&ids, 0)?;

        // Input contribution for every timestep at once: [max_len, 4 * hidden]
        let x_gates = embedded.matmul(&w.kernel)?.broadcast_add(&w.bias)?;

        let mut h = Tensor::zeros((1, hidden), DType::F32, &self.device)?;
        let mut c = Tensor::zeros((1, hidden), DType::F32, &self.device)?;

        for t in 0..self.config.max_len {
            let gates = (x_gates.narrow(0, t, 1)? + h.matmul(&w.recurrent_kernel)?)?;

            let i = sigmoid(&gates.narrow(1, 0, hidden)?)?;
            let f = sigmoid(&gates.narrow(1, hidden, hidden)?)?;
            let g = gates.narrow(1, 2 * hidden, hidden)?.tanh()?;
            let o = sigmoid(&gates.narrow(1, 3 * hidden, hidden)?)?;

            c = ((f * &c)? + (i * g)?)?;
            h = (o * c.tanh()?)?;
        }

        let logit = h.matmul(&w.dense_kernel)?.broadcast_add(&w.dense_bias)?;
        Ok(sigmoid(&logit)?)
    }
}

#[async_trait]
impl DgaModel for LstmClassifier {
    fn id(&self) -> &str {
        &self.config.model_id
    }

    fn device(&self) -> Device {
        self.device.clone()
    }

    async fn predict(&self, input: &Tensor) -> Result<Tensor> {
        self.forward(input)
    }
}
