//! # dgascan Core
//!
//! Prediction pipeline for spotting algorithmically generated domains.
//!
//! This crate provides:
//! - **Vocabulary encoding** of domains into fixed-length token sequences
//! - **Tensor construction** with scoped release of every tensor a call owns
//! - **Model abstraction** with an LSTM classifier loaded from SafeTensors
//! - **Threshold classification** of model probabilities

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod classify;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod tensor;
pub mod vocab;

pub use error::{DgaError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::classify::{classify, DomainClass, MALICIOUS_THRESHOLD};
    pub use crate::error::{DgaError, Result};
    pub use crate::model::{load_model, DgaModel, FixedModel, LstmClassifier, ModelHandle};
    pub use crate::pipeline::{predict, predict_with_ledger, PredictionResult, MODEL_ID};
    pub use crate::tensor::TensorLedger;
    pub use crate::vocab::{encode, pad, MAX_DOMAIN_LEN};
}
