//! Runtime configuration for the assembly pipeline.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `POPNET_DATA_DIR`: Directory of cached population artifacts (default: `data/populations`)
//! - `POPNET_CACHE_ENTRIES`: Loaded populations kept in memory (default: 8, minimum 1)
//! - `POPNET_TRIM_SEED`: Seed for degree trimming (default: 0)
//! - `POPNET_GENERATOR_SEED`: Seed for the reference generator (default: 0)

use std::path::PathBuf;

/// Configuration for the population pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory holding cached population artifacts.
    pub data_dir: PathBuf,
    /// Maximum loaded populations kept in the in-memory LRU.
    pub cache_entries: usize,
    /// Seed for degree trimming.
    pub trim_seed: u64,
    /// Seed for the reference generator.
    pub generator_seed: u64,
}

impl PipelineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("POPNET_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            cache_entries: std::env::var("POPNET_CACHE_ENTRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cache_entries),
            trim_seed: std::env::var("POPNET_TRIM_SEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.trim_seed),
            generator_seed: std::env::var("POPNET_GENERATOR_SEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.generator_seed),
        }
    }

    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the trim seed.
    pub fn with_trim_seed(mut self, seed: u64) -> Self {
        self.trim_seed = seed;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/populations"),
            cache_entries: 8,
            trim_seed: 0,
            generator_seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let config = PipelineConfig::default()
            .with_data_dir("/tmp/pops")
            .with_trim_seed(42);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/pops"));
        assert_eq!(config.trim_seed, 42);
        assert_eq!(config.cache_entries, 8);
    }
}
