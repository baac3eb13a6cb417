//! Request validation and pipeline configuration.

pub mod caps;
pub mod request;
pub mod pipeline;

pub use caps::{DegreeCaps, DEFAULT_SCHOOL_CAP, DEFAULT_WORK_CAP};
pub use request::{
    PopulationRequest, PopulationConfig, GenerationOptions,
    SUPPORTED_SIZES, DEFAULT_POPULATION_SIZE, DEFAULT_SHEET_NAME, DEFAULT_AVERAGE_LTCF_DEGREE,
};
pub use pipeline::PipelineConfig;

/// Configuration errors, detected before any I/O or synthesis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Size is not cached and synthesis was forbidden.
    #[error(
        "If generate=false, number of people must be one of {}, not {requested}",
        join_sizes(.allowed)
    )]
    UnsupportedSize {
        /// Requested size.
        requested: usize,
        /// Sizes with cached artifacts.
        allowed: Vec<usize>,
    },
    /// Two options that cannot be combined were both requested.
    #[error("Requesting both {first} and {second} is not supported")]
    ConflictingOptions {
        /// First option name.
        first: &'static str,
        /// Second option name.
        second: &'static str,
    },
    /// Degree cap below 1.
    #[error("Degree cap for layer {layer} must be a positive integer, not {value}")]
    InvalidDegreeCap {
        /// Layer code.
        layer: String,
        /// Rejected value.
        value: i64,
    },
    /// Cap override for a layer callers may not override.
    #[error("Degree cap for layer '{layer}' cannot be overridden; supported keys are S, W")]
    UnsupportedCapLayer {
        /// Rejected layer key.
        layer: String,
    },
    /// Facilities requested with a zero average degree.
    #[error("Average LTCF degree must be positive when facilities are requested, not {0}")]
    InvalidAverageLtcfDegree(u32),
}

fn join_sizes(sizes: &[usize]) -> String {
    sizes
        .iter()
        .map(|size| size.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
