//! Threshold classification of model probabilities.

use serde::{Deserialize, Serialize};

/// Probability above which a domain is labelled malicious.
///
/// Deliberately high: fewer false positives at the cost of more misses.
pub const MALICIOUS_THRESHOLD: f32 = 0.9;

/// Class assigned to a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DomainClass {
    /// Looks like a human-registered domain.
    Benign = 0,
    /// Looks algorithmically generated.
    Malicious = 1,
}

impl DomainClass {
    /// Numeric label, 0 or 1.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainClass::Benign => "benign",
            DomainClass::Malicious => "malicious",
        }
    }
}

impl From<DomainClass> for u8 {
    fn from(class: DomainClass) -> u8 {
        class.as_u8()
    }
}

impl TryFrom<u8> for DomainClass {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DomainClass::Benign),
            1 => Ok(DomainClass::Malicious),
            other => Err(format!("class must be 0 or 1, got {other}")),
        }
    }
}

impl std::fmt::Display for DomainClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a probability against [`MALICIOUS_THRESHOLD`].
///
/// Strictly greater than: `0.9` itself is benign. NaN is benign.
pub fn classify(probability: f32) -> DomainClass {
    if probability > MALICIOUS_THRESHOLD {
        DomainClass::Malicious
    } else {
        DomainClass::Benign
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_boundary() {
        assert_eq!(classify(0.9), DomainClass::Benign);
        assert_eq!(classify(0.900_000_1), DomainClass::Malicious);
        assert_eq!(classify(0.0), DomainClass::Benign);
        assert_eq!(classify(0.5), DomainClass::Benign);
        assert_eq!(classify(1.0), DomainClass::Malicious);
    }

    #[test]
    fn nan_is_benign() {
        assert_eq!(classify(f32::NAN), DomainClass::Benign);
    }

    #[test]
    fn class_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&DomainClass::Malicious).unwrap(), "1");
        assert_eq!(serde_json::to_string(&DomainClass::Benign).unwrap(), "0");

        let parsed: DomainClass = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, DomainClass::Malicious);
        assert!(serde_json::from_str::<DomainClass>("2").is_err());
    }
}
