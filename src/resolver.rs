//! Contact source resolution: load a cached population or synthesize one.
//!
//! ## Algorithm
//!
//! One cache attempt, then at most one synthesis attempt:
//!
//! 1. Load the population keyed by (location, size, options) from the store
//! 2. On success, return it. Generation mode is not consulted, and a hit
//!    wins even when facilities or industry codes were requested: the key
//!    already encodes those options, so a hit is an artifact built with them
//! 3. On any load failure with synthesis permitted, run the facility-aware
//!    generator if facilities were requested, the general generator otherwise
//! 4. On load failure with synthesis forbidden, fail with `Unavailable`
//!
//! Load failures are expected and never fatal on their own. Synthesis
//! failures are fatal and propagate.

use crate::config::PopulationConfig;
use crate::generator::{FacilityGenerator, GenerationError, SyntheticGenerator};
use crate::store::{LoadError, PopulationKey, PopulationStore};
use crate::types::{Location, Population};

/// Error type for resolver operations.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Cache load failed and synthesis was not permitted.
    #[error("No population available for {key}: cached load failed ({cause}) and generation is disabled")]
    Unavailable {
        /// Key that was looked up.
        key: PopulationKey,
        /// Why the load failed.
        #[source]
        cause: LoadError,
    },
    /// The generator failed.
    #[error("Synthesis of {size} people at {location} failed: {source}")]
    Synthesis {
        /// Requested size.
        size: usize,
        /// Requested location.
        location: Location,
        /// Generator error.
        #[source]
        source: GenerationError,
    },
}

/// Decides between the cached store and synthesis.
pub struct ContactSourceResolver<S, G, F> {
    store: S,
    generator: G,
    facility_generator: F,
}

impl<S, G, F> ContactSourceResolver<S, G, F>
where
    S: PopulationStore,
    G: SyntheticGenerator,
    F: FacilityGenerator,
{
    /// Create a resolver.
    pub fn new(store: S, generator: G, facility_generator: F) -> Self {
        Self {
            store,
            generator,
            facility_generator,
        }
    }

    /// Produce a population for a validated configuration.
    pub fn resolve(&self, config: &PopulationConfig) -> Result<Population, ResolveError> {
        let key = PopulationKey::from_config(config);

        let cause = match self.load_checked(&key) {
            Ok(population) => {
                tracing::info!(
                    key_hash = %key.key_hash(),
                    people = population.len(),
                    "Using cached population"
                );
                return Ok(population);
            }
            Err(cause) => cause,
        };

        match &cause {
            LoadError::NotFound { .. } => tracing::info!(
                key = %key,
                generate = config.generate,
                "No cached population"
            ),
            other => tracing::warn!(
                key = %key,
                kind = other.kind(),
                error = %other,
                generate = config.generate,
                "Cached population rejected"
            ),
        }

        if !config.generate {
            return Err(ResolveError::Unavailable { key, cause });
        }

        let synthesized = if config.options.use_long_term_care_facilities {
            self.facility_generator.synthesize_with_facilities(
                config.size,
                &config.location,
                config.options.use_two_group_reduction,
                config.options.average_ltcf_degree,
            )
        } else {
            self.generator
                .synthesize(config.size, &config.location, &config.sheet_name)
        };

        let synthesis_error = |source| ResolveError::Synthesis {
            size: config.size,
            location: config.location.clone(),
            source,
        };
        let mut population = synthesized.map_err(synthesis_error)?;
        if population.len() != config.size {
            return Err(synthesis_error(GenerationError::Failed(format!(
                "generator returned {} people",
                population.len()
            ))));
        }
        population.set_requested_size(config.size);

        tracing::info!(
            people = population.len(),
            source = %population.params().source,
            "Synthesized population"
        );
        Ok(population)
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load and reject artifacts whose size does not match the key.
    fn load_checked(&self, key: &PopulationKey) -> Result<Population, LoadError> {
        let mut population = self.store.load(key)?;
        if population.len() != key.size {
            return Err(LoadError::Incompatible {
                reason: format!("artifact has {} people, requested {}", population.len(), key.size),
            });
        }
        population.set_requested_size(key.size);
        Ok(population)
    }
}
