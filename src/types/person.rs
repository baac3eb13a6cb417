//! Individual types for the population graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an individual within a population.
///
/// Stable for the lifetime of the population and ordered so that every
/// iteration over people is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(u32);

impl PersonId {
    /// Create a new PersonId.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PersonId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Sex of an individual.
///
/// Serialized as its integer code (0 = female, 1 = male) to match the
/// layout of cached population artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Sex {
    /// Female (code 0).
    Female,
    /// Male (code 1).
    Male,
}

impl Sex {
    /// Integer code used in artifacts.
    pub fn code(&self) -> u8 {
        match self {
            Self::Female => 0,
            Self::Male => 1,
        }
    }

    /// Parse from integer code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Female),
            1 => Some(Self::Male),
            _ => None,
        }
    }
}

impl From<Sex> for u8 {
    fn from(sex: Sex) -> Self {
        sex.code()
    }
}

impl TryFrom<u8> for Sex {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("invalid sex code: {}", code))
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Female => write!(f, "female"),
            Self::Male => write!(f, "male"),
        }
    }
}

/// Role of an individual inside a long-term-care facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityRole {
    /// Lives in the facility.
    Resident,
    /// Works in the facility.
    Staff,
}

impl fmt::Display for FacilityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resident => write!(f, "resident"),
            Self::Staff => write!(f, "staff"),
        }
    }
}

/// Demographic record of one individual.
///
/// Contacts are not stored here; they live in the per-layer contact
/// relations of the owning [`Population`](super::Population) so that
/// both endpoints of an edge are always updated together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Identifier, unique within the population.
    pub id: PersonId,
    /// Age in years.
    pub age: u8,
    /// Sex.
    pub sex: Sex,
    /// Industry code of the individual's workplace, when assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry_code: Option<u32>,
    /// Facility membership, when the individual lives or works in an LTCF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_role: Option<FacilityRole>,
}

impl Person {
    /// Create a person with no industry code or facility role.
    pub fn new(id: PersonId, age: u8, sex: Sex) -> Self {
        Self {
            id,
            age,
            sex,
            industry_code: None,
            facility_role: None,
        }
    }

    /// Set the industry code.
    pub fn with_industry_code(mut self, code: u32) -> Self {
        self.industry_code = Some(code);
        self
    }

    /// Set the facility role.
    pub fn with_facility_role(mut self, role: FacilityRole) -> Self {
        self.facility_role = Some(role);
        self
    }
}
