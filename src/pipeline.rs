//! The population assembly pipeline.
//!
//! ```text
//! PopulationRequest → validate → resolve (cache | synthesize) → trim → normalize
//! ```
//!
//! Runs synchronously on the calling thread. The population is exclusively
//! owned by one invocation from assembly to normalization.

use std::time::Instant;

use crate::config::{ConfigError, PipelineConfig, PopulationConfig, PopulationRequest};
use crate::generator::{FacilityGenerator, ReferenceGenerator, SyntheticGenerator};
use crate::normalize::PopulationOutput;
use crate::resolver::{ContactSourceResolver, ResolveError};
use crate::store::{FilePopulationStore, LruPopulationStore, PopulationStore};
use crate::trimmer::{DegreeTrimmer, TrimReport};
use crate::types::Population;

/// Errors surfaced to callers of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid request; raised before any I/O.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// No population could be loaded or synthesized.
    #[error(transparent)]
    Source(#[from] ResolveError),
}

impl PipelineError {
    /// Short label for logs and service responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(ConfigError::UnsupportedSize { .. }) => "unsupported_size",
            Self::Config(ConfigError::ConflictingOptions { .. }) => "conflicting_options",
            Self::Config(_) => "invalid_config",
            Self::Source(ResolveError::Unavailable { .. }) => "population_unavailable",
            Self::Source(ResolveError::Synthesis { .. }) => "synthesis_failed",
        }
    }
}

/// A trimmed population with the configuration that produced it.
#[derive(Debug, Clone)]
pub struct AssembledPopulation {
    /// Validated configuration.
    pub config: PopulationConfig,
    /// Trimmed population.
    pub population: Population,
    /// What trimming removed.
    pub trim_report: TrimReport,
}

impl AssembledPopulation {
    /// Normalize into the caller-facing shape, honoring `config.structured`.
    pub fn to_output(&self) -> PopulationOutput {
        PopulationOutput::from_population(&self.population, self.config.structured)
    }
}

/// Validates requests, resolves a population, trims and normalizes it.
pub struct PopulationPipeline<S, G, F> {
    resolver: ContactSourceResolver<S, G, F>,
    trimmer: DegreeTrimmer,
}

impl<S, G, F> PopulationPipeline<S, G, F>
where
    S: PopulationStore,
    G: SyntheticGenerator,
    F: FacilityGenerator,
{
    /// Create a pipeline.
    pub fn new(store: S, generator: G, facility_generator: F, trim_seed: u64) -> Self {
        Self {
            resolver: ContactSourceResolver::new(store, generator, facility_generator),
            trimmer: DegreeTrimmer::new(trim_seed),
        }
    }

    /// Build a population and return it in the caller-facing shape.
    pub fn make_population(&self, request: &PopulationRequest) -> Result<PopulationOutput, PipelineError> {
        Ok(self.assemble(request)?.to_output())
    }

    /// Validate, resolve and trim, stopping short of normalization.
    pub fn assemble(&self, request: &PopulationRequest) -> Result<AssembledPopulation, PipelineError> {
        let start = Instant::now();
        let config = request.validate()?;

        let span = tracing::info_span!(
            "make_population",
            size = config.size,
            location = %config.location,
            generate = config.generate,
            caps = %config.caps.params_hash(),
        );
        let _guard = span.enter();

        let mut population = self.resolver.resolve(&config)?;
        let trim_report = self.trimmer.trim(&mut population, &config.caps);

        tracing::info!(
            people = population.len(),
            source = %population.params().source,
            edges_removed = trim_report.edges_removed(),
            fingerprint = %population.fingerprint(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Population assembled"
        );

        Ok(AssembledPopulation {
            config,
            population,
            trim_report,
        })
    }

    /// The trimmer, for re-trimming populations built elsewhere.
    pub fn trimmer(&self) -> &DegreeTrimmer {
        &self.trimmer
    }

    /// The resolver.
    pub fn resolver(&self) -> &ContactSourceResolver<S, G, F> {
        &self.resolver
    }
}

/// Pipeline over an LRU-cached file store and the reference generator.
pub type DefaultPipeline =
    PopulationPipeline<LruPopulationStore<FilePopulationStore>, ReferenceGenerator, ReferenceGenerator>;

impl DefaultPipeline {
    /// Build the default pipeline from runtime configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let store = LruPopulationStore::new(
            FilePopulationStore::new(config.data_dir.clone()),
            config.cache_entries,
        );
        let generator = ReferenceGenerator::new(config.generator_seed);
        Self::new(store, generator.clone(), generator, config.trim_seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPopulationStore;
    use crate::types::{Layer, PopulationSource};

    fn pipeline() -> PopulationPipeline<InMemoryPopulationStore, ReferenceGenerator, ReferenceGenerator> {
        let generator = ReferenceGenerator::new(4);
        PopulationPipeline::new(InMemoryPopulationStore::new(), generator.clone(), generator, 0)
    }

    #[test]
    fn test_config_error_before_resolution() {
        let err = pipeline()
            .make_population(&PopulationRequest::new().with_size(7_000).with_generate(false))
            .unwrap_err();
        assert_eq!(err.kind(), "unsupported_size");
    }

    #[test]
    fn test_unavailable_kind() {
        let err = pipeline()
            .make_population(&PopulationRequest::new().with_size(5_000))
            .unwrap_err();
        assert_eq!(err.kind(), "population_unavailable");
    }

    #[test]
    fn test_assemble_trims_to_caps() {
        let assembled = pipeline()
            .assemble(&PopulationRequest::new().with_size(1_500).with_max_contacts("W", 4))
            .unwrap();

        assert_eq!(assembled.population.params().source, PopulationSource::Synthesized);
        assert!(assembled.population.layer(Layer::Work).unwrap().max_degree() <= 4);
        assert!(assembled.population.layer(Layer::School).unwrap().max_degree() <= 20);
        assert!(!assembled.trim_report.is_noop());
        assert_eq!(assembled.to_output().len(), 1_500);
    }

    #[test]
    fn test_default_pipeline_with_empty_dir_synthesizes() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = DefaultPipeline::from_config(&PipelineConfig::default().with_data_dir(dir.path()));

        let output = pipeline
            .make_population(&PopulationRequest::new().with_size(5_000).with_generate(true).structured())
            .unwrap();

        assert_eq!(output.len(), 5_000);
        assert!(output.as_structured().is_some());
        assert_eq!(pipeline.resolver().store().stats().misses, 1);
    }
}
