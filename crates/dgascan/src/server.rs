//! HTTP query server.
//!
//! ```text
//! GET /query?domain=<domain>   -> {"modelId","domain","class","probability"}
//! GET /health                  -> {"status","modelLoaded","liveTensors"}
//! ```
//!
//! The query endpoint only checks that a domain was supplied; it does not
//! apply the interactive syntax rules.

use crate::detector::Detector;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dgascan_core::DgaError;
use serde::{Deserialize, Serialize};

/// Query string of `GET /query`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    /// Domain to classify.
    pub domain: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` while the server answers.
    pub status: String,
    /// Whether predictions can be served.
    pub model_loaded: bool,
    /// Tensors held by in-flight predictions.
    pub live_tensors: u64,
}

/// Failures of `GET /query`, each mapped to a status code.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// `domain` missing or empty.
    #[error("Domain parameter is required")]
    MissingDomain,

    /// No model has been loaded yet.
    #[error("Model not loaded")]
    ModelNotLoaded,

    /// The pipeline failed.
    #[error("Internal Server Error")]
    Prediction(#[source] DgaError),
}

impl QueryError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            QueryError::MissingDomain => StatusCode::BAD_REQUEST,
            QueryError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            QueryError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DgaError> for QueryError {
    fn from(err: DgaError) -> Self {
        match err {
            DgaError::ModelNotLoaded => QueryError::ModelNotLoaded,
            other => QueryError::Prediction(other),
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Create the query router.
///
/// # Example
///
/// ```rust,no_run
/// use dgascan::{create_router, Detector};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let detector = Detector::builder().model_dir("public/model").build().await?;
///     let listener = tokio::net::TcpListener::bind("0.0.0.0:8888").await?;
///     axum::serve(listener, create_router(detector)).await?;
///     Ok(())
/// }
/// ```
pub fn create_router(detector: Detector) -> Router {
    Router::new()
        .route("/query", get(query_handler))
        .route("/health", get(health_handler))
        .with_state(detector)
}

/// `GET /query` handler.
pub async fn query_handler(
    State(detector): State<Detector>,
    Query(params): Query<QueryParams>,
) -> Result<Json<dgascan_core::pipeline::PredictionResult>, QueryError> {
    let domain = params
        .domain
        .filter(|d| !d.is_empty())
        .ok_or(QueryError::MissingDomain)?;

    match detector.predict(&domain).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            let err = QueryError::from(e);
            match &err {
                QueryError::ModelNotLoaded => {
                    tracing::warn!(%domain, "query rejected, model not loaded")
                }
                QueryError::Prediction(cause) => {
                    tracing::error!(%domain, error = %cause, "error during prediction")
                }
                QueryError::MissingDomain => {}
            }
            Err(err)
        }
    }
}

/// `GET /health` handler.
pub async fn health_handler(State(detector): State<Detector>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: detector.is_model_loaded(),
        live_tensors: detector.live_tensors(),
    })
}

/// Bind to the configured address and serve until Ctrl-C.
pub async fn serve(detector: Detector) -> anyhow::Result<()> {
    let addr = detector.config().bind_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, model_loaded = detector.is_model_loaded(), "server listening");

    axum::serve(listener, create_router(detector))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
