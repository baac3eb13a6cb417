//! Core types for the population graph.

pub mod person;
pub mod layer;
pub mod contact;
pub mod population;

pub use person::{PersonId, Person, Sex, FacilityRole};
pub use layer::Layer;
pub use contact::{ContactEdge, ContactLayer};
pub use population::{Population, PopulationParams, PopulationSource, PopulationError, Location};
