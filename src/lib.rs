//! # popnet-kernel
//!
//! Synthetic population contact-network assembly for agent-based epidemic
//! simulation.
//!
//! The kernel answers one question:
//!
//! > Given demographic parameters, which population and which contacts per layer?
//!
//! ## Core Contract
//!
//! 1. Validate the request (supported sizes, option conflicts, degree caps)
//! 2. Reuse a cached population for the request, or synthesize one when permitted
//! 3. Trim over-connected layers down to their degree caps
//! 4. Export every individual with ordered contact lists per layer
//!
//! ## Architecture
//!
//! ```text
//! PopulationRequest → validate → ContactSourceResolver → DegreeTrimmer → normalize
//!                                    ↓            ↓
//!                           PopulationStore   SyntheticGenerator / FacilityGenerator
//! ```
//!
//! ## Graph Guarantees
//!
//! - Every layer is undirected: edges are registered and removed on both endpoints at once
//! - No individual contacts itself; every endpoint is a known individual
//! - Iteration over people, layers and contacts is in ascending order
//! - Trimming is seeded and only ever removes edges

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod config;
pub mod store;
pub mod generator;
pub mod resolver;
pub mod trimmer;
pub mod normalize;
pub mod pipeline;
pub mod canonical;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    PersonId, Person, Sex, FacilityRole, Layer, ContactEdge, ContactLayer,
    Population, PopulationParams, PopulationSource, PopulationError, Location,
};
pub use config::{
    ConfigError, DegreeCaps, PopulationRequest, PopulationConfig, GenerationOptions, PipelineConfig,
    SUPPORTED_SIZES, DEFAULT_POPULATION_SIZE,
};
pub use store::{
    PopulationStore, PopulationKey, LoadError, SaveError,
    InMemoryPopulationStore, FilePopulationStore, LruPopulationStore, CacheStats,
};
pub use generator::{
    SyntheticGenerator, FacilityGenerator, GenerationError,
    ReferenceGenerator, ReferenceGeneratorConfig,
};
pub use resolver::{ContactSourceResolver, ResolveError};
pub use trimmer::{DegreeTrimmer, TrimReport, LayerTrimStats, trim_population};
pub use normalize::{
    normalize, PersonRecord, PopulationMap, PopulationOutput, StructuredPopulation, StructuredPerson,
};
pub use pipeline::{PopulationPipeline, DefaultPipeline, AssembledPopulation, PipelineError};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Schema version of cached population artifacts.
/// Increment on breaking changes to the artifact layout.
pub const POPULATION_SCHEMA_VERSION: &str = "1.0.0";
