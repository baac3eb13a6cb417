//! Axum routes for the population service.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{DegreeCaps, PopulationRequest, DEFAULT_POPULATION_SIZE, SUPPORTED_SIZES};
use crate::normalize::{normalize, PopulationMap};
use crate::pipeline::{AssembledPopulation, PipelineError};
use crate::trimmer::TrimReport;
use crate::types::{Layer, Location, PopulationSource};
use crate::POPULATION_SCHEMA_VERSION;

use super::middleware::record_population_metrics;
use super::state::ServiceState;

/// Type alias for the shared service state.
pub type AppState = ServiceState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to assemble a population.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopulationBody {
    /// Pipeline inputs.
    #[serde(flatten)]
    pub request: PopulationRequest,
    /// Include the normalized people map in the response.
    #[serde(default)]
    pub include_people: bool,
}

/// Summary of an assembled population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationResponse {
    /// Number of individuals.
    pub size: usize,
    /// Size the caller asked for.
    pub requested_size: usize,
    /// Where the population came from.
    pub source: PopulationSource,
    /// Location it was built for.
    pub location: Location,
    /// xxHash64 fingerprint of people and edges.
    pub fingerprint: String,
    /// Caps applied, by layer.
    pub caps: BTreeMap<Layer, u32>,
    /// Undirected edge counts per layer, after trimming.
    pub edge_counts: BTreeMap<Layer, usize>,
    /// What trimming removed.
    pub trim_report: TrimReport,
    /// Normalized people, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people: Option<PopulationMap>,
}

impl PopulationResponse {
    fn from_assembled(assembled: &AssembledPopulation, include_people: bool) -> Self {
        let population = &assembled.population;
        Self {
            size: population.len(),
            requested_size: population.params().requested_size,
            source: population.params().source,
            location: population.params().location.clone(),
            fingerprint: population.fingerprint(),
            caps: assembled.config.caps.iter().collect(),
            edge_counts: population
                .layers()
                .map(|(layer, contacts)| (layer, contacts.edge_count()))
                .collect(),
            trim_report: assembled.trim_report.clone(),
            people: include_people.then(|| normalize(population)),
        }
    }
}

/// Supported sizes and default caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizesResponse {
    /// Sizes available as cached artifacts.
    pub supported_sizes: Vec<usize>,
    /// Size used when a request names none.
    pub default_size: usize,
    /// Default caps by layer.
    pub default_caps: BTreeMap<Layer, u32>,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub schema_version: String,
    /// Artifact directory.
    pub data_dir: String,
    /// Whether the artifact directory exists.
    pub data_dir_present: bool,
    /// In-process cache statistics.
    pub cache: CacheHealth,
}

/// Cache health information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHealth {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Error returned by handlers.
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::Config(_) => StatusCode::BAD_REQUEST,
            PipelineError::Source(crate::resolver::ResolveError::Unavailable { .. }) => StatusCode::NOT_FOUND,
            PipelineError::Source(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mut body = ErrorResponse::new(err.kind().to_uppercase(), err.to_string());
        if let Some(source) = std::error::Error::source(&err) {
            body = body.with_details(source.to_string());
        }
        Self { status, body }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(
            status = self.status.as_u16(),
            code = %self.body.code,
            error = %self.body.error,
            "Request error"
        );
        (self.status, Json(self.body)).into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Assemble a population on the blocking pool.
async fn population_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PopulationBody>,
) -> Result<Json<PopulationResponse>, ApiError> {
    let start = Instant::now();
    let pipeline = Arc::clone(&state.pipeline);
    let PopulationBody { request, include_people } = body;

    let assembled = tokio::task::spawn_blocking(move || pipeline.assemble(&request))
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse::new("TASK_FAILED", format!("Assembly task failed: {}", e)),
        })??;

    let response = PopulationResponse::from_assembled(&assembled, include_people);
    record_population_metrics(
        response.size,
        response.trim_report.edges_removed(),
        &response.source.to_string(),
        start.elapsed().as_millis() as u64,
    );

    Ok(Json(response))
}

/// List supported sizes and default caps.
async fn sizes_handler() -> Json<SizesResponse> {
    Json(SizesResponse {
        supported_sizes: SUPPORTED_SIZES.to_vec(),
        default_size: DEFAULT_POPULATION_SIZE,
        default_caps: DegreeCaps::defaults().iter().collect(),
    })
}

/// Health check endpoint (detailed).
///
/// Reports `degraded` when the artifact directory is missing: every request
/// then has to synthesize.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let data_dir_present = state.config.data_dir.is_dir();
    let stats = state.pipeline.resolver().store().stats();

    Json(HealthResponse {
        status: if data_dir_present { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: POPULATION_SCHEMA_VERSION.to_string(),
        data_dir: state.config.data_dir.display().to_string(),
        data_dir_present,
        cache: CacheHealth {
            entries: stats.len,
            capacity: stats.cap,
            hits: stats.hits,
            misses: stats.misses,
        },
    })
}

/// Liveness probe endpoint.
///
/// Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the population service.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/population", post(population_handler))
        .route("/api/population/sizes", get(sizes_handler))
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .with_state(state)
}
