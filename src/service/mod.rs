//! Population Kernel REST Service
//!
//! Exposes the population pipeline as a REST API.
//!
//! ## Endpoints
//!
//! - `POST /api/population` - Assemble a trimmed population
//! - `GET /api/population/sizes` - Supported cached sizes and default caps
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_population_metrics};
pub use routes::{create_router, AppState};
pub use state::ServiceState;
