//! Population Kernel Service Binary
//!
//! Runs the population pipeline as a REST API service:
//! - Structured JSON logging
//! - Request tracing with correlation IDs
//! - Graceful shutdown handling
//! - Health check endpoints
//!
//! ## Configuration
//!
//! Environment variables:
//! - `POPNET_DATA_DIR`: Directory of cached population artifacts (default: data/populations)
//! - `POPNET_CACHE_ENTRIES`: In-process LRU capacity (default: 8)
//! - `POPNET_TRIM_SEED`: Seed for degree trimming (default: 0)
//! - `POPNET_GENERATOR_SEED`: Seed for the reference generator (default: 0)
//! - `PORT`: Service port (default: 8002)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! POPNET_DATA_DIR=/srv/populations cargo run --bin popnet_service --features service
//! ```

use std::net::SocketAddr;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use popnet_kernel::service::{create_router, metrics_middleware, ServiceState};
use popnet_kernel::PipelineConfig;

/// Initialize tracing: JSON lines by default, `LOG_FORMAT=pretty` for development.
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").map_or(true, |format| format != "pretty");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "popnet_service=info,popnet_kernel=info,tower_http=info".into());

    let pretty = (!json).then(|| fmt::layer().with_target(true));
    let structured = json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .flatten_event(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(structured)
        .init();
}

/// Tags each request with a trace id (`X-Request-Id` or a fresh uuid).
///
/// Status and latency are logged by `metrics_middleware` inside this span.
async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get("X-Request-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let span = info_span!("request", trace_id = %trace_id);
    next.run(request).instrument(span).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    let build_sha = option_env!("BUILD_SHA").unwrap_or("dev");

    info!(
        version = version,
        build_sha = build_sha,
        "Starting Population Kernel Service"
    );

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8002);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    let config = PipelineConfig::from_env();
    if !config.data_dir.is_dir() {
        warn!(
            data_dir = %config.data_dir.display(),
            "Population artifact directory missing; requests will need generation"
        );
    }
    info!(
        data_dir = %config.data_dir.display(),
        cache_entries = config.cache_entries,
        trim_seed = config.trim_seed,
        generator_seed = config.generator_seed,
        "Pipeline configured"
    );

    let state = ServiceState::new(config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!(
        address = %addr,
        version = version,
        "Population Kernel Service listening"
    );

    let listener = TcpListener::bind(addr).await?;

    // Graceful shutdown handling
    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
            _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
        }
    };

    info!("Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Population Kernel Service shutdown complete");

    Ok(())
}
