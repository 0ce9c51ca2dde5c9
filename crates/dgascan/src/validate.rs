//! Domain syntax checks applied before a domain reaches the pipeline.
//!
//! The pipeline encodes anything it is given; this module is for
//! interactive boundaries that should refuse obviously malformed input
//! with an explanation instead.

use dgascan_core::DgaError;
use thiserror::Error;

/// Maximum total domain length.
pub const MAX_DOMAIN_CHARS: usize = 253;

/// Maximum length of a single label.
pub const MAX_LABEL_CHARS: usize = 63;

/// Minimum length of the top-level label.
pub const MIN_TLD_CHARS: usize = 2;

/// Why a domain was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainRejection {
    /// Nothing was entered.
    #[error("domain is empty")]
    Empty,

    /// Single label, e.g. `localhost`.
    #[error("domain must contain at least one dot")]
    MissingDot,

    /// Longer than [`MAX_DOMAIN_CHARS`].
    #[error("domain is {0} characters, the limit is 253")]
    TooLong(usize),

    /// Leading, trailing or doubled dot.
    #[error("label {index} is empty")]
    EmptyLabel {
        /// Zero-based label position.
        index: usize,
    },

    /// Label longer than [`MAX_LABEL_CHARS`].
    #[error("label {label:?} is longer than 63 characters")]
    LabelTooLong {
        /// Offending label.
        label: String,
    },

    /// Label with characters outside `[A-Za-z0-9-]` or a hyphen at either end.
    #[error("label {label:?} may only contain ASCII letters, digits and inner hyphens")]
    InvalidLabel {
        /// Offending label.
        label: String,
    },

    /// Top-level label shorter than [`MIN_TLD_CHARS`].
    #[error("top-level label {tld:?} must be at least 2 characters")]
    TldTooShort {
        /// The last label.
        tld: String,
    },
}

impl From<DomainRejection> for DgaError {
    fn from(rejection: DomainRejection) -> Self {
        DgaError::InvalidDomain(rejection.to_string())
    }
}

/// Check `domain` against the hostname rules used by the interactive checker.
pub fn validate_domain(domain: &str) -> Result<(), DomainRejection> {
    if domain.is_empty() {
        return Err(DomainRejection::Empty);
    }
    if !domain.contains('.') {
        return Err(DomainRejection::MissingDot);
    }
    if domain.len() > MAX_DOMAIN_CHARS {
        return Err(DomainRejection::TooLong(domain.len()));
    }

    for (index, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            return Err(DomainRejection::EmptyLabel { index });
        }
        if label.len() > MAX_LABEL_CHARS {
            return Err(DomainRejection::LabelTooLong {
                label: label.to_string(),
            });
        }
        if !is_valid_label(label) {
            return Err(DomainRejection::InvalidLabel {
                label: label.to_string(),
            });
        }
    }

    // Non-empty and contains a dot, so there is a last label.
    let tld = domain.rsplit('.').next().unwrap_or_default();
    if tld.len() < MIN_TLD_CHARS {
        return Err(DomainRejection::TldTooShort {
            tld: tld.to_string(),
        });
    }

    Ok(())
}

fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    let edges_ok = match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric(),
        _ => false,
    };
    edges_ok && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}
