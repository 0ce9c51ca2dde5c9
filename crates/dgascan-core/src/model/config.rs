//! Model configuration.

use crate::error::{DgaError, Result};
use crate::vocab::{MAX_DOMAIN_LEN, VOCAB_SIZE};
use serde::{Deserialize, Serialize};

/// Identifier of the bundled CACIC 2018 classifier.
pub const DEFAULT_MODEL_ID: &str = "cacic-2018-model";

/// Configuration for the LSTM domain classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Vocabulary size.
    pub vocab_size: usize,
    /// Embedding dimension.
    pub embedding_dim: usize,
    /// LSTM hidden units.
    pub hidden_size: usize,
    /// Input sequence length.
    pub max_len: usize,
    /// Identifier reported with every prediction.
    #[serde(default = "default_model_id")]
    pub model_id: String,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

impl ModelConfig {
    /// Load from JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the config is usable with the fixed vocabulary and input length.
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size != VOCAB_SIZE {
            return Err(DgaError::ModelError(format!(
                "vocab_size must be {}, got {}",
                VOCAB_SIZE, self.vocab_size
            )));
        }
        if self.max_len != MAX_DOMAIN_LEN {
            return Err(DgaError::ModelError(format!(
                "max_len must be {}, got {}",
                MAX_DOMAIN_LEN, self.max_len
            )));
        }
        if self.embedding_dim == 0 || self.hidden_size == 0 {
            return Err(DgaError::ModelError(
                "embedding_dim and hidden_size must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Width of the stacked LSTM gate projections.
    pub fn gate_width(&self) -> usize {
        4 * self.hidden_size
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        // CACIC 2018 LSTM defaults
        Self {
            vocab_size: VOCAB_SIZE,
            embedding_dim: 128,
            hidden_size: 128,
            max_len: MAX_DOMAIN_LEN,
            model_id: default_model_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = ModelConfig::default();
        config.validate().unwrap();
        assert_eq!(config.gate_width(), 512);
        assert_eq!(config.model_id, "cacic-2018-model");
    }

    #[test]
    fn parse_without_model_id() {
        let json = r#"{"vocab_size":40,"embedding_dim":8,"hidden_size":4,"max_len":45}"#;
        let config: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.hidden_size, 4);
    }

    #[test]
    fn wrong_vocab_rejected() {
        let config = ModelConfig {
            vocab_size: 41,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn wrong_length_rejected() {
        let config = ModelConfig {
            max_len: 64,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = ModelConfig {
            embedding_dim: 16,
            hidden_size: 8,
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        assert_eq!(ModelConfig::from_file(&path).unwrap(), config);
    }
}
