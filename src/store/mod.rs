//! Cached population stores.
//!
//! A store answers one question: is there a materialized population for
//! this key? Every failure is typed, but the resolver treats all of them
//! as "not available" and falls back to synthesis when permitted.

pub mod memory;
pub mod file;
pub mod cached;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::canonical::canonical_hash_hex;
use crate::config::{GenerationOptions, PopulationConfig};
use crate::types::{Location, Population};

/// Lookup key for a cached population.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopulationKey {
    /// Location triple.
    pub location: Location,
    /// Number of people.
    pub size: usize,
    /// Structural options the artifact was built with.
    pub options: GenerationOptions,
}

impl PopulationKey {
    /// Create a key.
    pub fn new(location: Location, size: usize, options: GenerationOptions) -> Self {
        Self { location, size, options }
    }

    /// Key for a validated configuration.
    pub fn from_config(config: &PopulationConfig) -> Self {
        Self::new(config.location.clone(), config.size, config.options.clone())
    }

    /// Stable hash of the key.
    pub fn key_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

impl fmt::Display for PopulationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} n={} microstructure={} industry_code={} ltcf={} two_group_reduction={} ltcf_degree={}",
            self.location,
            self.size,
            self.options.use_microstructure,
            self.options.use_industry_code,
            self.options.use_long_term_care_facilities,
            self.options.use_two_group_reduction,
            self.options.average_ltcf_degree,
        )
    }
}

/// Why a cached population could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No artifact exists for the key.
    #[error("No cached population for {key}")]
    NotFound {
        /// Requested key.
        key: PopulationKey,
    },
    /// An artifact exists but was built for different parameters.
    #[error("Cached population is incompatible: {reason}")]
    Incompatible {
        /// Description of the mismatch.
        reason: String,
    },
    /// The artifact exists but cannot be decoded into a valid population.
    #[error("Cached population is malformed: {reason}")]
    Malformed {
        /// Description of the defect.
        reason: String,
    },
    /// Reading the artifact failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Artifact path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Incompatible { .. } => "incompatible",
            Self::Malformed { .. } => "malformed",
            Self::Io { .. } => "io",
        }
    }
}

/// Why an artifact could not be written.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// Encoding the artifact failed.
    #[error("Failed to encode population artifact: {0}")]
    Encode(#[from] serde_json::Error),
    /// Writing the artifact failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Artifact path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Trait for cached population backends.
///
/// Loading blocks the calling thread until the artifact is read and
/// decoded. Returned populations belong to the caller, who may mutate them.
pub trait PopulationStore: Send + Sync {
    /// Load the population stored under `key`.
    fn load(&self, key: &PopulationKey) -> Result<Population, LoadError>;
}

impl<S: PopulationStore + ?Sized> PopulationStore for std::sync::Arc<S> {
    fn load(&self, key: &PopulationKey) -> Result<Population, LoadError> {
        (**self).load(key)
    }
}

pub use memory::InMemoryPopulationStore;
pub use file::{FilePopulationStore, PopulationArtifact, ArtifactManifest};
pub use cached::{LruPopulationStore, CacheStats};
