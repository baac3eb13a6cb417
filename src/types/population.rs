//! The layer graph store: people plus per-layer contact relations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::canonical::canonical_hash_hex;
use super::contact::{ContactEdge, ContactLayer};
use super::layer::Layer;
use super::person::{Person, PersonId};

/// Errors raised when building a population from parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PopulationError {
    /// Two records share an identifier.
    #[error("Duplicate person id: {0}")]
    DuplicatePerson(PersonId),
    /// An edge references an individual that is not in the population.
    #[error("Layer {layer} references unknown person {id}")]
    UnknownPerson {
        /// Layer of the offending edge.
        layer: Layer,
        /// Missing identifier.
        id: PersonId,
    },
    /// An edge connects an individual to itself.
    #[error("Layer {layer} contains a self-contact for person {id}")]
    SelfContact {
        /// Layer of the offending edge.
        layer: Layer,
        /// Identifier of the individual.
        id: PersonId,
    },
}

/// Geographic identifiers forwarded to stores and generators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Country (e.g. `usa`).
    pub country: String,
    /// State or province (e.g. `Washington`).
    pub state: String,
    /// Metro area or locality (e.g. `seattle_metro`).
    pub location: String,
}

impl Location {
    /// Create a location triple.
    pub fn new(
        country: impl Into<String>,
        state: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into(),
            state: state.into(),
            location: location.into(),
        }
    }

    /// The Seattle metro area, the location cached populations are built for.
    pub fn seattle_metro() -> Self {
        Self::new("usa", "Washington", "seattle_metro")
    }

    /// Whether any component is blank.
    pub fn has_blank_component(&self) -> bool {
        [&self.country, &self.state, &self.location]
            .iter()
            .any(|s| s.trim().is_empty())
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::seattle_metro()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.country, self.state, self.location)
    }
}

/// How a population was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationSource {
    /// Loaded from a population store.
    Cache,
    /// Built by the general synthetic generator.
    Synthesized,
    /// Built by the facility-aware synthetic generator.
    SynthesizedWithFacilities,
}

impl fmt::Display for PopulationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Synthesized => write!(f, "synthesized"),
            Self::SynthesizedWithFacilities => write!(f, "synthesized_with_facilities"),
        }
    }
}

/// Parameters a population was produced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationParams {
    /// Population size that was requested.
    pub requested_size: usize,
    /// Location the population describes.
    pub location: Location,
    /// Producer of the population.
    pub source: PopulationSource,
}

impl PopulationParams {
    /// Create population parameters.
    pub fn new(requested_size: usize, location: Location, source: PopulationSource) -> Self {
        Self {
            requested_size,
            location,
            source,
        }
    }
}

/// Indexed collection of individuals with per-layer contact relations.
///
/// Every edge endpoint is a known individual and no individual contacts
/// itself. Contact relations are only reachable through [`ContactLayer`],
/// which keeps each layer symmetric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Population {
    params: PopulationParams,
    people: BTreeMap<PersonId, Person>,
    layers: BTreeMap<Layer, ContactLayer>,
}

impl Population {
    /// Create an empty population.
    pub fn new(params: PopulationParams) -> Self {
        Self {
            params,
            people: BTreeMap::new(),
            layers: BTreeMap::new(),
        }
    }

    /// Build a population from people and canonical edge lists.
    ///
    /// Fails on duplicate people, self-contacts, or edges to unknown people.
    pub fn from_parts(
        params: PopulationParams,
        people: Vec<Person>,
        edges: BTreeMap<Layer, Vec<ContactEdge>>,
    ) -> Result<Self, PopulationError> {
        let mut population = Self::new(params);
        for person in people {
            population.add_person(person)?;
        }
        for (layer, layer_edges) in edges {
            population.add_layer(layer);
            for edge in layer_edges {
                population.connect(layer, edge.low, edge.high)?;
            }
        }
        Ok(population)
    }

    /// Add an individual.
    pub fn add_person(&mut self, person: Person) -> Result<(), PopulationError> {
        if self.people.contains_key(&person.id) {
            return Err(PopulationError::DuplicatePerson(person.id));
        }
        self.people.insert(person.id, person);
        Ok(())
    }

    /// Ensure a layer exists, even if it ends up with no edges.
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.entry(layer).or_default();
    }

    /// Register an undirected contact in `layer`.
    ///
    /// Returns `Ok(true)` if the edge was new.
    pub fn connect(&mut self, layer: Layer, a: PersonId, b: PersonId) -> Result<bool, PopulationError> {
        if a == b {
            return Err(PopulationError::SelfContact { layer, id: a });
        }
        for id in [a, b] {
            if !self.people.contains_key(&id) {
                return Err(PopulationError::UnknownPerson { layer, id });
            }
        }
        Ok(self.layers.entry(layer).or_default().connect(a, b))
    }

    /// Remove an undirected contact from `layer`.
    pub fn disconnect(&mut self, layer: Layer, a: PersonId, b: PersonId) -> bool {
        self.layers
            .get_mut(&layer)
            .map_or(false, |contacts| contacts.disconnect(a, b))
    }

    /// Parameters the population was produced with.
    pub fn params(&self) -> &PopulationParams {
        &self.params
    }

    /// Replace the requested size recorded in the parameters.
    pub fn set_requested_size(&mut self, size: usize) {
        self.params.requested_size = size;
    }

    /// Replace the producer recorded in the parameters.
    pub fn set_source(&mut self, source: PopulationSource) {
        self.params.source = source;
    }

    /// Look up an individual.
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.get(&id)
    }

    /// All individuals, ascending by identifier.
    pub fn people(&self) -> impl Iterator<Item = &Person> + '_ {
        self.people.values()
    }

    /// Number of individuals.
    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// Whether the population has no individuals.
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Contact relation of one layer.
    pub fn layer(&self, layer: Layer) -> Option<&ContactLayer> {
        self.layers.get(&layer)
    }

    pub(crate) fn layer_mut(&mut self, layer: Layer) -> Option<&mut ContactLayer> {
        self.layers.get_mut(&layer)
    }

    /// Layers present in the population, in canonical order.
    pub fn layer_names(&self) -> impl Iterator<Item = Layer> + '_ {
        self.layers.keys().copied()
    }

    /// All layers with their contact relations.
    pub fn layers(&self) -> impl Iterator<Item = (Layer, &ContactLayer)> + '_ {
        self.layers.iter().map(|(layer, contacts)| (*layer, contacts))
    }

    /// Degree of `id` in `layer` (0 if the layer is absent).
    pub fn degree(&self, layer: Layer, id: PersonId) -> usize {
        self.layers.get(&layer).map_or(0, |contacts| contacts.degree(id))
    }

    /// Whether every layer satisfies the symmetry invariant.
    pub fn is_symmetric(&self) -> bool {
        self.layers.values().all(ContactLayer::is_symmetric)
    }

    /// Canonical edge lists per layer.
    pub fn edge_lists(&self) -> BTreeMap<Layer, Vec<ContactEdge>> {
        self.layers
            .iter()
            .map(|(layer, contacts)| (*layer, contacts.edges()))
            .collect()
    }

    /// Deterministic fingerprint of people and contacts.
    ///
    /// Identical populations (same people, same edges) yield identical
    /// fingerprints regardless of how they were built.
    pub fn fingerprint(&self) -> String {
        let people: Vec<&Person> = self.people.values().collect();
        let edges = self.edge_lists();
        canonical_hash_hex(&(people, edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sex;

    fn params() -> PopulationParams {
        PopulationParams::new(3, Location::default(), PopulationSource::Synthesized)
    }

    fn three_people() -> Population {
        let mut population = Population::new(params());
        for i in 0..3 {
            population
                .add_person(Person::new(PersonId::new(i), 30, Sex::Female))
                .unwrap();
        }
        population
    }

    #[test]
    fn test_duplicate_person_rejected() {
        let mut population = three_people();
        let err = population
            .add_person(Person::new(PersonId::new(1), 5, Sex::Male))
            .unwrap_err();
        assert_eq!(err, PopulationError::DuplicatePerson(PersonId::new(1)));
    }

    #[test]
    fn test_connect_validates_endpoints() {
        let mut population = three_people();
        let a = PersonId::new(0);
        let missing = PersonId::new(99);

        assert!(matches!(
            population.connect(Layer::Household, a, missing),
            Err(PopulationError::UnknownPerson { id, .. }) if id == missing
        ));
        assert!(matches!(
            population.connect(Layer::Household, a, a),
            Err(PopulationError::SelfContact { .. })
        ));
        assert!(population.connect(Layer::Household, a, PersonId::new(1)).unwrap());
        assert_eq!(population.degree(Layer::Household, PersonId::new(1)), 1);
        assert_eq!(population.degree(Layer::School, PersonId::new(1)), 0);
    }

    #[test]
    fn test_from_parts_roundtrip_fingerprint() {
        let mut population = three_people();
        population.add_layer(Layer::School);
        population.connect(Layer::Household, PersonId::new(0), PersonId::new(2)).unwrap();
        population.connect(Layer::Work, PersonId::new(1), PersonId::new(2)).unwrap();

        let rebuilt = Population::from_parts(
            population.params().clone(),
            population.people().cloned().collect(),
            population.edge_lists(),
        )
        .unwrap();

        assert_eq!(rebuilt, population);
        assert_eq!(rebuilt.fingerprint(), population.fingerprint());
        assert!(rebuilt.layer(Layer::School).unwrap().is_empty());
    }

    #[test]
    fn test_fingerprint_changes_with_edges() {
        let mut population = three_people();
        let before = population.fingerprint();
        population.connect(Layer::Community, PersonId::new(0), PersonId::new(1)).unwrap();
        assert_ne!(before, population.fingerprint());
    }

    #[test]
    fn test_location_blank_component() {
        assert!(!Location::seattle_metro().has_blank_component());
        assert!(Location::new("usa", " ", "x").has_blank_component());
    }
}
