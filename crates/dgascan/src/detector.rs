//! Detector host: owns the loaded model and runs predictions against it.

use crate::validate::validate_domain;
use anyhow::{Context, Result};
use dgascan_core::model::{load_model, ModelHandle};
use dgascan_core::pipeline::{predict_with_ledger, PredictionResult};
use dgascan_core::tensor::TensorLedger;
use dgascan_core::DgaError;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default model directory, relative to the working directory.
pub const DEFAULT_MODEL_DIR: &str = "public/model";

/// Default listen address for the query server.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8888";

/// Configuration for the detector.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Directory holding `config.json` and the `.safetensors` weights.
    pub model_dir: PathBuf,
    /// Address the query server binds to.
    pub bind_addr: SocketAddr,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8888)),
        }
    }
}

/// Holder for the process-wide model.
///
/// Empty until a load succeeds. Readers clone the handle out and release the
/// lock before running inference, so a load never waits on a prediction.
#[derive(Default)]
pub struct ModelSlot {
    inner: RwLock<Option<ModelHandle>>,
}

impl ModelSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot that already holds `model`.
    pub fn with_model(model: ModelHandle) -> Self {
        Self {
            inner: RwLock::new(Some(model)),
        }
    }

    /// Current model, if one is loaded.
    pub fn get(&self) -> Option<ModelHandle> {
        self.inner.read().clone()
    }

    /// Install a model. Later predictions use it.
    pub fn set(&self, model: ModelHandle) {
        *self.inner.write() = Some(model);
    }

    /// Whether a model is available.
    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl std::fmt::Debug for ModelSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.get().map(|m| m.id().to_string());
        f.debug_struct("ModelSlot").field("model", &id).finish()
    }
}

/// Builder for creating a Detector.
pub struct DetectorBuilder {
    config: DetectorConfig,
    model: Option<ModelHandle>,
    defer_load: bool,
}

impl DetectorBuilder {
    /// Create a new detector builder.
    pub fn new() -> Self {
        Self {
            config: DetectorConfig::default(),
            model: None,
            defer_load: false,
        }
    }

    /// Set model directory.
    pub fn model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.model_dir = dir.into();
        self
    }

    /// Set server bind address.
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    /// Use an already loaded model instead of reading `model_dir`.
    pub fn model(mut self, model: ModelHandle) -> Self {
        self.model = Some(model);
        self
    }

    /// Skip loading in [`DetectorBuilder::build`]; the first
    /// [`Detector::check_or_load`] or [`Detector::reload`] loads instead.
    pub fn defer_load(mut self) -> Self {
        self.defer_load = true;
        self
    }

    /// Build the detector.
    ///
    /// A model that fails to load is logged and leaves the detector running
    /// without one; predictions then fail with [`DgaError::ModelNotLoaded`].
    pub async fn build(self) -> Result<Detector> {
        let slot = match self.model {
            Some(model) => ModelSlot::with_model(model),
            None if self.defer_load => ModelSlot::new(),
            None => {
                let slot = ModelSlot::new();
                match load_from(self.config.model_dir.clone()).await? {
                    Ok(model) => slot.set(model),
                    Err(e) => tracing::error!(
                        dir = %self.config.model_dir.display(),
                        error = %e,
                        "failed to load model, predictions are disabled until it loads"
                    ),
                }
                slot
            }
        };

        Ok(Detector {
            config: self.config,
            slot: Arc::new(slot),
            ledger: Arc::new(TensorLedger::new()),
        })
    }
}

impl Default for DetectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Load the model off the async runtime.
async fn load_from(dir: PathBuf) -> Result<dgascan_core::Result<ModelHandle>> {
    Ok(tokio::task::spawn_blocking(move || load_model(dir)).await?)
}

/// DGA detector sharing one read-only model across all requests.
#[derive(Clone)]
pub struct Detector {
    config: DetectorConfig,
    slot: Arc<ModelSlot>,
    ledger: Arc<TensorLedger>,
}

impl Detector {
    /// Create a new detector builder.
    pub fn builder() -> DetectorBuilder {
        DetectorBuilder::new()
    }

    /// Get detector configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Whether a model is loaded.
    pub fn is_model_loaded(&self) -> bool {
        self.slot.is_loaded()
    }

    /// Tensors currently held by in-flight predictions.
    pub fn live_tensors(&self) -> u64 {
        self.ledger.live()
    }

    /// Tensor ledger shared by this detector's predictions.
    pub fn ledger(&self) -> &TensorLedger {
        &self.ledger
    }

    /// Try to load the model from `model_dir` again and install it.
    pub async fn reload(&self) -> Result<()> {
        let model = load_from(self.config.model_dir.clone()).await??;
        self.slot.set(model);
        Ok(())
    }

    /// Keep retrying [`Detector::reload`] every `interval` until a model is loaded.
    ///
    /// Returns immediately if a model is already present.
    pub fn retry_load(&self, interval: Duration) -> JoinHandle<()> {
        let detector = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            while !detector.is_model_loaded() {
                ticker.tick().await;
                match detector.reload().await {
                    Ok(()) => tracing::info!("model became available"),
                    Err(e) => tracing::debug!(error = %e, "model still unavailable"),
                }
            }
        })
    }

    /// Classify a domain as given. Query-server entry point.
    pub async fn predict(&self, domain: &str) -> dgascan_core::Result<PredictionResult> {
        let model = self.slot.get().ok_or(DgaError::ModelNotLoaded)?;
        predict_with_ledger(model.as_ref(), domain, &self.ledger).await
    }

    /// Validate and classify a domain. Interactive-checker entry point.
    pub async fn check(&self, domain: &str) -> dgascan_core::Result<PredictionResult> {
        validate_domain(domain)?;
        self.predict(domain).await
    }

    /// Validate, load the model if none is present, then classify.
    ///
    /// Invalid input is rejected before any load is attempted.
    pub async fn check_or_load(&self, domain: &str) -> Result<PredictionResult> {
        validate_domain(domain)?;
        if !self.is_model_loaded() {
            self.reload().await.with_context(|| {
                format!(
                    "failed to load model from {}",
                    self.config.model_dir.display()
                )
            })?;
        }
        Ok(self.predict(domain).await?)
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("config", &self.config)
            .field("slot", &self.slot)
            .field("live_tensors", &self.ledger.live())
            .finish()
    }
}
