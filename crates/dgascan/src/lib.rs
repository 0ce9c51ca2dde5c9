//! # dgascan
//!
//! Detector for algorithmically generated (DGA) domain names.
//!
//! dgascan hosts a character-level classifier and exposes it two ways:
//! - **Query server**: `GET /query?domain=...` answers with a JSON verdict
//! - **Checker**: validates a typed domain and reports the verdict with a
//!   confidence percentage
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dgascan::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let detector = Detector::builder()
//!         .model_dir("public/model")
//!         .build()
//!         .await?;
//!
//!     let result = detector.check("xk29fjz81.net").await?;
//!     println!("{}: {} ({})", result.domain, result.class, result.confidence_percent());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Re-export core crate
pub use dgascan_core::*;

pub mod detector;
pub mod server;
pub mod validate;

pub use detector::{Detector, DetectorBuilder, DetectorConfig, ModelSlot};
pub use server::{create_router, serve, HealthResponse, QueryError};
pub use validate::{validate_domain, DomainRejection};

/// Commonly used types.
pub mod prelude {
    pub use crate::detector::{Detector, DetectorBuilder, DetectorConfig};
    pub use crate::server::{create_router, serve};
    pub use crate::validate::{validate_domain, DomainRejection};
    pub use dgascan_core::prelude::*;

    // Re-export useful external types
    pub use anyhow;
    pub use tokio;
    pub use tracing;
}
