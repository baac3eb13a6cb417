//! Synthetic population generators.
//!
//! The statistical generators that sample household, school and workplace
//! structure from census distributions live outside this crate; the
//! pipeline only sees these traits. [`ReferenceGenerator`] is a seeded
//! implementation of both, with plausible shape and no claim to realism.

pub mod reference;

use crate::types::{Location, Population, PopulationError};

/// Errors raised by a generator. Always fatal to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Zero people requested.
    #[error("Cannot synthesize an empty population")]
    EmptyPopulation,
    /// Location data the generator cannot use.
    #[error("Invalid location for synthesis: {location}")]
    InvalidLocation {
        /// Offending location, as displayed.
        location: String,
    },
    /// Sheet name the generator does not know.
    #[error("Unknown contact-matrix sheet: '{0}'")]
    UnknownSheet(String),
    /// The generator produced an inconsistent graph.
    #[error("Generated population is inconsistent: {0}")]
    Inconsistent(#[from] PopulationError),
    /// Any other generator failure.
    #[error("Synthesis failed: {0}")]
    Failed(String),
}

/// General synthetic generator: household, school, work and community layers.
pub trait SyntheticGenerator: Send + Sync {
    /// Build a population of exactly `size` people.
    fn synthesize(
        &self,
        size: usize,
        location: &Location,
        sheet_name: &str,
    ) -> Result<Population, GenerationError>;
}

/// Facility-aware generator: the general layers plus long-term-care facilities.
pub trait FacilityGenerator: Send + Sync {
    /// Build a population of exactly `size` people with LTCF residents and staff.
    fn synthesize_with_facilities(
        &self,
        size: usize,
        location: &Location,
        use_two_group_reduction: bool,
        average_ltcf_degree: u32,
    ) -> Result<Population, GenerationError>;
}

impl<G: SyntheticGenerator + ?Sized> SyntheticGenerator for std::sync::Arc<G> {
    fn synthesize(
        &self,
        size: usize,
        location: &Location,
        sheet_name: &str,
    ) -> Result<Population, GenerationError> {
        (**self).synthesize(size, location, sheet_name)
    }
}

impl<G: FacilityGenerator + ?Sized> FacilityGenerator for std::sync::Arc<G> {
    fn synthesize_with_facilities(
        &self,
        size: usize,
        location: &Location,
        use_two_group_reduction: bool,
        average_ltcf_degree: u32,
    ) -> Result<Population, GenerationError> {
        (**self).synthesize_with_facilities(size, location, use_two_group_reduction, average_ltcf_degree)
    }
}

pub use reference::{ReferenceGenerator, ReferenceGeneratorConfig};
