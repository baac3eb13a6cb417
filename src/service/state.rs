//! Shared service state.

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::pipeline::DefaultPipeline;

/// Shared service state.
///
/// Holds the pipeline behind an `Arc` so handlers can move it onto the
/// blocking pool.
#[derive(Clone)]
pub struct ServiceState {
    /// The assembly pipeline.
    pub pipeline: Arc<DefaultPipeline>,
    /// Configuration the pipeline was built from.
    pub config: Arc<PipelineConfig>,
}

impl ServiceState {
    /// Build state from a pipeline configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            pipeline: Arc::new(DefaultPipeline::from_config(&config)),
            config: Arc::new(config),
        }
    }

    /// Build state from environment variables.
    ///
    /// See [`PipelineConfig::from_env`].
    pub fn from_env() -> Self {
        Self::new(PipelineConfig::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_clones_share_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let state = ServiceState::new(PipelineConfig::default().with_data_dir(dir.path()));
        let other = state.clone();

        assert!(Arc::ptr_eq(&state.pipeline, &other.pipeline));
        assert_eq!(other.config.data_dir, dir.path());
    }
}
