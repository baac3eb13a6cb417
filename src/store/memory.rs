//! In-memory population store for testing and embedding.

use std::collections::HashMap;

use crate::types::{Population, PopulationSource};
use super::{LoadError, PopulationKey, PopulationStore};

/// In-memory population store.
///
/// Loads return a clone tagged with [`PopulationSource::Cache`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryPopulationStore {
    populations: HashMap<PopulationKey, Population>,
}

impl InMemoryPopulationStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a population under a key, replacing any previous entry.
    pub fn insert(&mut self, key: PopulationKey, population: Population) {
        self.populations.insert(key, population);
    }

    /// Get number of stored populations.
    pub fn len(&self) -> usize {
        self.populations.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.populations.is_empty()
    }
}

impl PopulationStore for InMemoryPopulationStore {
    fn load(&self, key: &PopulationKey) -> Result<Population, LoadError> {
        let mut population = self
            .populations
            .get(key)
            .cloned()
            .ok_or_else(|| LoadError::NotFound { key: key.clone() })?;
        population.set_source(PopulationSource::Cache);
        Ok(population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationOptions;
    use crate::types::{Location, Person, PersonId, PopulationParams, Sex};

    fn make_population(n: u32) -> Population {
        let mut population = Population::new(PopulationParams::new(
            n as usize,
            Location::default(),
            PopulationSource::Synthesized,
        ));
        for i in 0..n {
            population
                .add_person(Person::new(PersonId::new(i), 40, Sex::Male))
                .unwrap();
        }
        population
    }

    #[test]
    fn test_insert_and_load() {
        let key = PopulationKey::new(Location::default(), 3, GenerationOptions::default());
        let mut store = InMemoryPopulationStore::new();
        store.insert(key.clone(), make_population(3));

        let loaded = store.load(&key).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.params().source, PopulationSource::Cache);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_key_not_found() {
        let store = InMemoryPopulationStore::new();
        let key = PopulationKey::new(Location::default(), 3, GenerationOptions::default());
        let err = store.load(&key).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_options_are_part_of_key() {
        let key = PopulationKey::new(Location::default(), 3, GenerationOptions::default());
        let mut store = InMemoryPopulationStore::new();
        store.insert(key.clone(), make_population(3));

        let mut ltcf_key = key;
        ltcf_key.options.use_long_term_care_facilities = true;
        assert!(matches!(store.load(&ltcf_key), Err(LoadError::NotFound { .. })));
    }
}
