//! Caller-facing population request and its validated form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Location;
use super::caps::DegreeCaps;
use super::ConfigError;

/// Population sizes available as cached artifacts.
pub const SUPPORTED_SIZES: [usize; 7] = [5_000, 6_000, 10_000, 20_000, 50_000, 100_000, 120_000];

/// Size used when the request does not name one.
pub const DEFAULT_POPULATION_SIZE: usize = 10_000;

/// Sheet name handed to the general synthetic generator.
pub const DEFAULT_SHEET_NAME: &str = "United States of America";

/// Default average degree inside long-term-care facilities.
pub const DEFAULT_AVERAGE_LTCF_DEGREE: u32 = 20;

/// Structural options forwarded to stores and generators.
///
/// Part of the cache key: an artifact only matches a request with the
/// same options.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Build household/school/work microstructure.
    pub use_microstructure: bool,
    /// Assign industry codes to workplaces.
    pub use_industry_code: bool,
    /// Build long-term-care facilities.
    pub use_long_term_care_facilities: bool,
    /// Reduce facility contacts across the resident and staff groups.
    pub use_two_group_reduction: bool,
    /// Target average degree inside facilities.
    pub average_ltcf_degree: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            use_microstructure: true,
            use_industry_code: false,
            use_long_term_care_facilities: false,
            use_two_group_reduction: true,
            average_ltcf_degree: DEFAULT_AVERAGE_LTCF_DEGREE,
        }
    }
}

/// Request for a population, as supplied by a caller.
///
/// `generate` is tri-state: `None` lets the validator decide, `Some(true)`
/// permits synthesis when no cached artifact matches, `Some(false)` forbids it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationRequest {
    /// Number of people (defaults to [`DEFAULT_POPULATION_SIZE`]).
    pub size: Option<usize>,
    /// Degree-cap overrides keyed by layer code (`S`, `W`).
    pub max_contacts: BTreeMap<String, i64>,
    /// Wrap the result for structured access.
    pub structured: bool,
    /// Permit or forbid synthesis on a cache miss.
    pub generate: Option<bool>,
    /// Assign industry codes.
    pub with_industry_code: bool,
    /// Build long-term-care facilities.
    pub with_facilities: bool,
    /// Use two-group reduction inside facilities.
    pub use_two_group_reduction: bool,
    /// Average degree inside facilities.
    pub average_ltcf_degree: u32,
    /// Location triple.
    pub location: Location,
    /// Sheet name for the general generator.
    pub sheet_name: String,
}

impl Default for PopulationRequest {
    fn default() -> Self {
        Self {
            size: None,
            max_contacts: BTreeMap::new(),
            structured: false,
            generate: None,
            with_industry_code: false,
            with_facilities: false,
            use_two_group_reduction: true,
            average_ltcf_degree: DEFAULT_AVERAGE_LTCF_DEGREE,
            location: Location::default(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

impl PopulationRequest {
    /// Create a request with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the population size.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Override the cap of one layer (by code).
    pub fn with_max_contacts(mut self, layer: impl Into<String>, cap: i64) -> Self {
        self.max_contacts.insert(layer.into(), cap);
        self
    }

    /// Request structured access to the result.
    pub fn structured(mut self) -> Self {
        self.structured = true;
        self
    }

    /// Force the generation mode.
    pub fn with_generate(mut self, generate: bool) -> Self {
        self.generate = Some(generate);
        self
    }

    /// Request industry codes.
    pub fn with_industry_code(mut self, enabled: bool) -> Self {
        self.with_industry_code = enabled;
        self
    }

    /// Request long-term-care facilities.
    pub fn with_facilities(mut self, enabled: bool) -> Self {
        self.with_facilities = enabled;
        self
    }

    /// Toggle two-group reduction.
    pub fn with_two_group_reduction(mut self, enabled: bool) -> Self {
        self.use_two_group_reduction = enabled;
        self
    }

    /// Set the average facility degree.
    pub fn with_average_ltcf_degree(mut self, degree: u32) -> Self {
        self.average_ltcf_degree = degree;
        self
    }

    /// Set the location triple.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Validate the request and resolve every default.
    ///
    /// Pure: performs no I/O. Checks run in this order: size against the
    /// supported set, degree-cap merge, option conflicts.
    pub fn validate(&self) -> Result<PopulationConfig, ConfigError> {
        let size = self.size.unwrap_or(DEFAULT_POPULATION_SIZE);

        let generate = if SUPPORTED_SIZES.contains(&size) {
            self.generate.unwrap_or(false)
        } else if self.generate == Some(false) {
            return Err(ConfigError::UnsupportedSize {
                requested: size,
                allowed: SUPPORTED_SIZES.to_vec(),
            });
        } else {
            // No artifact exists for this size
            true
        };

        let caps = DegreeCaps::defaults().merge_overrides(&self.max_contacts)?;

        if self.with_facilities && self.with_industry_code {
            return Err(ConfigError::ConflictingOptions {
                first: "with_facilities",
                second: "with_industry_code",
            });
        }
        if self.with_facilities && self.average_ltcf_degree == 0 {
            return Err(ConfigError::InvalidAverageLtcfDegree(self.average_ltcf_degree));
        }

        Ok(PopulationConfig {
            size,
            generate,
            caps,
            structured: self.structured,
            location: self.location.clone(),
            sheet_name: self.sheet_name.clone(),
            options: GenerationOptions {
                use_microstructure: true,
                use_industry_code: self.with_industry_code,
                use_long_term_care_facilities: self.with_facilities,
                use_two_group_reduction: self.use_two_group_reduction,
                average_ltcf_degree: self.average_ltcf_degree,
            },
        })
    }
}

/// Fully resolved, validated configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of people.
    pub size: usize,
    /// Whether synthesis is permitted on a cache miss.
    pub generate: bool,
    /// Degree caps after merging overrides over defaults.
    pub caps: DegreeCaps,
    /// Wrap the result for structured access.
    pub structured: bool,
    /// Location triple.
    pub location: Location,
    /// Sheet name for the general generator.
    pub sheet_name: String,
    /// Structural options.
    pub options: GenerationOptions,
}

impl PopulationConfig {
    /// Whether `size` is one of the cached sizes.
    pub fn is_supported_size(&self) -> bool {
        SUPPORTED_SIZES.contains(&self.size)
    }
}
