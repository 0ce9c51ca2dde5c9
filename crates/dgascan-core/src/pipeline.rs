//! Single-domain prediction pipeline.
//!
//! ```text
//! domain ─► encode ─► pad(45) ─► (1, 45) tensor ─► model ─► probability ─► class
//! ```
//!
//! Encoding, padding and classification cannot fail. Only the model can,
//! and its failure is returned as [`DgaError::ModelInference`] without any
//! fallback result. Input and output tensors are held as [`ScopedTensor`]s
//! and are released before `predict` returns on every path.
//!
//! # Example
//!
//! ```rust
//! use dgascan_core::model::FixedModel;
//! use dgascan_core::pipeline::predict;
//! use dgascan_core::classify::DomainClass;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let model = FixedModel::new(0.97);
//! let result = predict(&model, "xk29fjz81.net").await.unwrap();
//!
//! assert_eq!(result.model_id, "cacic-2018-model");
//! assert_eq!(result.class, DomainClass::Malicious);
//! # });
//! ```

use crate::classify::{classify, DomainClass};
use crate::error::{DgaError, Result};
use crate::model::{DgaModel, DEFAULT_MODEL_ID};
use crate::tensor::{build_input, ScopedTensor, TensorLedger, TensorRole};
use crate::vocab::encode_padded;
use candle_core::{DType, Tensor};
use serde::{Deserialize, Serialize};

/// Model identifier reported in every result.
pub const MODEL_ID: &str = DEFAULT_MODEL_ID;

/// Outcome of classifying one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Always [`MODEL_ID`].
    pub model_id: String,
    /// The domain exactly as supplied, case preserved.
    pub domain: String,
    /// Threshold decision.
    pub class: DomainClass,
    /// Model probability that the domain is generated.
    pub probability: f32,
}

impl PredictionResult {
    /// Whether the domain was classified as generated.
    pub fn is_malicious(&self) -> bool {
        self.class == DomainClass::Malicious
    }

    /// Probability as a percentage with two decimals, e.g. `"97.31%"`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}

/// Run the model on a prepared input and extract the leading probability.
///
/// The model's output tensor is scoped to this call.
pub async fn infer(model: &dyn DgaModel, input: &Tensor, ledger: &TensorLedger) -> Result<f32> {
    let output = model.predict(input).await.map_err(DgaError::inference)?;
    let output = ScopedTensor::acquire(output, TensorRole::Output, ledger);
    first_scalar(&output).map_err(DgaError::inference)
}

fn first_scalar(output: &Tensor) -> Result<f32> {
    let flat = output.flatten_all()?;
    if flat.elem_count() == 0 {
        return Err(DgaError::ShapeMismatch(format!(
            "model output is empty: {:?}",
            output.dims()
        )));
    }
    Ok(flat.get(0)?.to_dtype(DType::F32)?.to_scalar::<f32>()?)
}

/// Classify `domain`, counting tensors in the process-wide ledger.
pub async fn predict(model: &dyn DgaModel, domain: &str) -> Result<PredictionResult> {
    predict_with_ledger(model, domain, TensorLedger::global()).await
}

/// Classify `domain`, counting tensors in `ledger`.
#[tracing::instrument(level = "debug", skip(model, ledger), fields(model = model.id()))]
pub async fn predict_with_ledger(
    model: &dyn DgaModel,
    domain: &str,
    ledger: &TensorLedger,
) -> Result<PredictionResult> {
    let padded = encode_padded(domain);
    let input = ScopedTensor::acquire(
        build_input(&padded, &model.device())?,
        TensorRole::Input,
        ledger,
    );

    let probability = match infer(model, &input, ledger).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "prediction failed");
            return Err(e);
        }
    };
    let class = classify(probability);
    tracing::debug!(probability, class = class.as_str(), "prediction complete");

    Ok(PredictionResult {
        model_id: MODEL_ID.to_string(),
        domain: domain.to_string(),
        class,
        probability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FixedModel, LstmClassifier, LstmWeights, ModelConfig};
    use crate::vocab::{encode, MAX_DOMAIN_LEN};
    use async_trait::async_trait;
    use candle_core::Device;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records what the pipeline hands to the model and how many tensors
    /// were live at that moment.
    struct TrackingModel {
        ledger: Arc<TensorLedger>,
        probability: f32,
        fail: bool,
        seen: Mutex<Vec<(Vec<u32>, u64)>>,
    }

    impl TrackingModel {
        fn new(ledger: Arc<TensorLedger>, probability: f32) -> Self {
            Self {
                ledger,
                probability,
                fail: false,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(ledger: Arc<TensorLedger>) -> Self {
            Self {
                fail: true,
                ..Self::new(ledger, 0.0)
            }
        }
    }

    #[async_trait]
    impl DgaModel for TrackingModel {
        fn id(&self) -> &str {
            "tracking"
        }

        async fn predict(&self, input: &Tensor) -> Result<Tensor> {
            let ids: Vec<Vec<u32>> = input.to_vec2()?;
            self.seen.lock().push((ids[0].clone(), self.ledger.live()));
            if self.fail {
                return Err(DgaError::ModelError("graph execution failed".into()));
            }
            Ok(Tensor::new(&[[self.probability]], input.device())?)
        }
    }

    #[tokio::test]
    async fn google_scenario() {
        let ledger = Arc::new(TensorLedger::new());
        let model = TrackingModel::new(ledger.clone(), 0.01);

        let result = predict_with_ledger(&model, "google.com", &ledger)
            .await
            .unwrap();

        assert_eq!(encode("google.com").len(), 10);
        assert_eq!(result.model_id, "cacic-2018-model");
        assert_eq!(result.domain, "google.com");
        assert_eq!(result.class, DomainClass::Benign);
        assert!((result.probability - 0.01).abs() < 1e-7);

        let seen = model.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.len(), MAX_DOMAIN_LEN);
        assert_eq!(seen[0].0, encode_padded("google.com"));
    }

    #[tokio::test]
    async fn dga_like_scenario_follows_threshold() {
        for (p, expected) in [
            (0.95, DomainClass::Malicious),
            (0.9, DomainClass::Benign),
            (0.42, DomainClass::Benign),
        ] {
            let model = FixedModel::new(p);
            let ledger = TensorLedger::new();
            let result = predict_with_ledger(&model, "xk29fjz81.net", &ledger)
                .await
                .unwrap();
            assert_eq!(result.class, expected, "p = {p}");
            assert_eq!(result.probability, p);
        }
    }

    #[tokio::test]
    async fn domain_case_is_preserved_but_not_encoded() {
        let ledger = Arc::new(TensorLedger::new());
        let model = TrackingModel::new(ledger.clone(), 0.5);

        let upper = predict_with_ledger(&model, "Google.COM", &ledger).await.unwrap();
        let lower = predict_with_ledger(&model, "google.com", &ledger).await.unwrap();

        assert_eq!(upper.domain, "Google.COM");
        let seen = model.seen.lock();
        assert_eq!(seen[0].0, seen[1].0);
        assert_eq!(upper.probability, lower.probability);
    }

    #[tokio::test]
    async fn long_domain_truncated_before_model() {
        let ledger = Arc::new(TensorLedger::new());
        let model = TrackingModel::new(ledger.clone(), 0.5);

        let head = "abcdefghij".repeat(4) + "klmno";
        let d1 = format!("{head}{}", "p".repeat(15));
        let d2 = format!("{head}{}", "q".repeat(15));
        assert_eq!(d1.len(), 60);

        predict_with_ledger(&model, &d1, &ledger).await.unwrap();
        predict_with_ledger(&model, &d2, &ledger).await.unwrap();

        let seen = model.seen.lock();
        assert_eq!(seen[0].0, seen[1].0);
        assert_eq!(seen[0].0, encode(&head));
    }

    #[tokio::test]
    async fn inference_failure_propagates_and_releases() {
        let ledger = Arc::new(TensorLedger::new());
        let model = TrackingModel::failing(ledger.clone());

        let err = predict_with_ledger(&model, "google.com", &ledger)
            .await
            .unwrap_err();

        match err {
            DgaError::ModelInference { source } => {
                assert_eq!(source.to_string(), "model error: graph execution failed");
            }
            other => panic!("expected inference error, got {other:?}"),
        }

        // The input tensor was live while the model ran, and gone afterwards.
        assert_eq!(model.seen.lock()[0].1, 1);
        assert_eq!(ledger.acquired(), 1);
        assert_eq!(ledger.released(), 1);
        assert_eq!(ledger.live(), 0);
    }

    #[tokio::test]
    async fn success_releases_input_and_output() {
        let ledger = Arc::new(TensorLedger::new());
        let model = TrackingModel::new(ledger.clone(), 0.99);

        let result = predict_with_ledger(&model, "xk29fjz81.net", &ledger)
            .await
            .unwrap();
        assert!(result.is_malicious());

        assert_eq!(ledger.acquired(), 2);
        assert_eq!(ledger.released(), 2);
        assert_eq!(ledger.live(), 0);
    }

    #[tokio::test]
    async fn empty_output_is_inference_error() {
        struct EmptyModel;

        #[async_trait]
        impl DgaModel for EmptyModel {
            fn id(&self) -> &str {
                "empty"
            }

            async fn predict(&self, input: &Tensor) -> Result<Tensor> {
                Ok(Tensor::zeros((1, 0), DType::F32, input.device())?)
            }
        }

        let ledger = TensorLedger::new();
        let err = predict_with_ledger(&EmptyModel, "a.bc", &ledger)
            .await
            .unwrap_err();

        assert!(err.is_inference());
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.acquired(), 2);
    }

    #[tokio::test]
    async fn lstm_end_to_end() {
        let config = ModelConfig {
            embedding_dim: 8,
            hidden_size: 4,
            ..Default::default()
        };
        let weights = LstmWeights::constant(&config, 3.0, &Device::Cpu).unwrap();
        let model = LstmClassifier::new(config, weights, Device::Cpu).unwrap();

        let ledger = TensorLedger::new();
        let result = predict_with_ledger(&model, "xk29fjz81.net", &ledger)
            .await
            .unwrap();

        // sigmoid(3.0) ~= 0.9526
        assert_eq!(result.class, DomainClass::Malicious);
        assert_eq!(result.confidence_percent(), "95.26%");
        assert_eq!(ledger.live(), 0);
    }

    #[tokio::test]
    async fn concurrent_failures_do_not_affect_successes() {
        let ledger = Arc::new(TensorLedger::new());
        let good: Arc<dyn DgaModel> = Arc::new(FixedModel::new(0.2));
        let bad: Arc<dyn DgaModel> = Arc::new(TrackingModel::failing(ledger.clone()));

        let mut handles = Vec::new();
        for i in 0..32 {
            let model = if i % 2 == 0 { good.clone() } else { bad.clone() };
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                let domain = format!("host{i}.example.com");
                predict_with_ledger(model.as_ref(), &domain, &ledger).await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.unwrap();
            if i % 2 == 0 {
                let result = result.unwrap();
                assert_eq!(result.domain, format!("host{i}.example.com"));
                assert_eq!(result.class, DomainClass::Benign);
            } else {
                assert!(result.unwrap_err().is_inference());
            }
        }

        assert_eq!(ledger.live(), 0);
        // 16 successes x 2 tensors + 16 failures x 1 tensor
        assert_eq!(ledger.acquired(), 48);
    }

    #[test]
    fn result_serializes_with_camel_case_fields() {
        let result = PredictionResult {
            model_id: MODEL_ID.to_string(),
            domain: "google.com".to_string(),
            class: DomainClass::Benign,
            probability: 0.5,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "modelId": "cacic-2018-model",
                "domain": "google.com",
                "class": 0,
                "probability": 0.5
            })
        );
    }
}
