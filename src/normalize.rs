//! Conversion of the layer graph store into the caller-facing shape.
//!
//! Contact sets become sequences in ascending identifier order. Every
//! individual is visited once and, for each individual, every layer of the
//! population once, so each record lists all layers (empty ones included).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;

use crate::types::{FacilityRole, Layer, PersonId, Population, PopulationParams, Sex};

/// One individual in the caller-facing shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Age in years.
    pub age: u8,
    /// Sex.
    pub sex: Sex,
    /// Industry code, when assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry_code: Option<u32>,
    /// Facility role, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_role: Option<FacilityRole>,
    /// Contacts per layer, ascending by identifier.
    pub contacts: BTreeMap<Layer, Vec<PersonId>>,
}

/// Mapping from identifier to record.
pub type PopulationMap = BTreeMap<PersonId, PersonRecord>;

/// Convert a population into its plain mapping.
pub fn normalize(population: &Population) -> PopulationMap {
    population
        .people()
        .map(|person| {
            let contacts = population
                .layers()
                .map(|(layer, relation)| (layer, relation.contacts(person.id).collect()))
                .collect();
            let record = PersonRecord {
                age: person.age,
                sex: person.sex,
                industry_code: person.industry_code,
                facility_role: person.facility_role,
                contacts,
            };
            (person.id, record)
        })
        .collect()
}

/// Normalized population with typed accessors.
///
/// Wraps the same mapping a plain result holds; derefs to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredPopulation {
    params: PopulationParams,
    people: PopulationMap,
}

impl StructuredPopulation {
    /// Wrap a normalized mapping.
    pub fn new(params: PopulationParams, people: PopulationMap) -> Self {
        Self { params, people }
    }

    /// Parameters the population was produced with.
    pub fn params(&self) -> &PopulationParams {
        &self.params
    }

    /// Typed view of one individual.
    pub fn person(&self, id: PersonId) -> Option<StructuredPerson<'_>> {
        self.people.get(&id).map(|record| StructuredPerson { id, record })
    }

    /// Typed views of every individual, ascending.
    pub fn iter(&self) -> impl Iterator<Item = StructuredPerson<'_>> + '_ {
        self.people
            .iter()
            .map(|(id, record)| StructuredPerson { id: *id, record })
    }

    /// Unwrap into the plain mapping.
    pub fn into_map(self) -> PopulationMap {
        self.people
    }
}

impl Deref for StructuredPopulation {
    type Target = PopulationMap;

    fn deref(&self) -> &Self::Target {
        &self.people
    }
}

/// Borrowed typed view of one record.
#[derive(Debug, Clone, Copy)]
pub struct StructuredPerson<'a> {
    id: PersonId,
    record: &'a PersonRecord,
}

impl<'a> StructuredPerson<'a> {
    /// Identifier.
    pub fn id(&self) -> PersonId {
        self.id
    }

    /// Age in years.
    pub fn age(&self) -> u8 {
        self.record.age
    }

    /// Sex.
    pub fn sex(&self) -> Sex {
        self.record.sex
    }

    /// Contacts in one layer (empty if the layer is absent).
    pub fn contacts(&self, layer: Layer) -> &'a [PersonId] {
        self.record
            .contacts
            .get(&layer)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Contact count in one layer.
    pub fn degree(&self, layer: Layer) -> usize {
        self.contacts(layer).len()
    }

    /// The underlying record.
    pub fn record(&self) -> &'a PersonRecord {
        self.record
    }
}

/// Result of the pipeline: plain or structured, same data either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PopulationOutput {
    /// Plain mapping.
    Plain(PopulationMap),
    /// Mapping wrapped with typed accessors.
    Structured(StructuredPopulation),
}

impl PopulationOutput {
    /// Normalize a population, wrapping it if `structured`.
    pub fn from_population(population: &Population, structured: bool) -> Self {
        let people = normalize(population);
        if structured {
            Self::Structured(StructuredPopulation::new(population.params().clone(), people))
        } else {
            Self::Plain(people)
        }
    }

    /// The mapping, regardless of wrapping.
    pub fn as_map(&self) -> &PopulationMap {
        match self {
            Self::Plain(people) => people,
            Self::Structured(structured) => &structured.people,
        }
    }

    /// Unwrap into the mapping.
    pub fn into_map(self) -> PopulationMap {
        match self {
            Self::Plain(people) => people,
            Self::Structured(structured) => structured.into_map(),
        }
    }

    /// Structured view, if requested.
    pub fn as_structured(&self) -> Option<&StructuredPopulation> {
        match self {
            Self::Structured(structured) => Some(structured),
            Self::Plain(_) => None,
        }
    }

    /// Number of individuals.
    pub fn len(&self) -> usize {
        self.as_map().len()
    }

    /// Whether there are no individuals.
    pub fn is_empty(&self) -> bool {
        self.as_map().is_empty()
    }

    /// Record of one individual.
    pub fn get(&self, id: PersonId) -> Option<&PersonRecord> {
        self.as_map().get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Person, PopulationSource};

    fn p(id: u32) -> PersonId {
        PersonId::new(id)
    }

    fn sample() -> Population {
        let mut population = Population::new(PopulationParams::new(
            4,
            Location::default(),
            PopulationSource::Cache,
        ));
        for i in 0..4 {
            let mut person = Person::new(p(i), 10 * i as u8, Sex::Male);
            if i == 3 {
                person = person.with_industry_code(42);
            }
            population.add_person(person).unwrap();
        }
        population.add_layer(Layer::School);
        population.connect(Layer::Household, p(0), p(3)).unwrap();
        population.connect(Layer::Household, p(0), p(1)).unwrap();
        population.connect(Layer::Household, p(2), p(0)).unwrap();
        population
    }

    #[test]
    fn test_contacts_sorted_and_every_layer_listed() {
        let people = normalize(&sample());
        assert_eq!(people.len(), 4);

        let first = &people[&p(0)];
        assert_eq!(first.contacts[&Layer::Household], vec![p(1), p(2), p(3)]);
        assert_eq!(first.contacts[&Layer::School], Vec::<PersonId>::new());
        assert_eq!(first.contacts.len(), 2);

        for record in people.values() {
            assert_eq!(record.contacts.len(), 2);
        }
        assert_eq!(people[&p(3)].industry_code, Some(42));
    }

    #[test]
    fn test_structured_wraps_same_data() {
        let population = sample();
        let plain = PopulationOutput::from_population(&population, false);
        let structured = PopulationOutput::from_population(&population, true);

        assert!(plain.as_structured().is_none());
        assert_eq!(plain.as_map(), structured.as_map());

        let view = structured.as_structured().unwrap();
        let person = view.person(p(0)).unwrap();
        assert_eq!(person.age(), 0);
        assert_eq!(person.degree(Layer::Household), 3);
        assert!(person.contacts(Layer::Work).is_empty());
        assert_eq!(view.params().source, PopulationSource::Cache);
        assert_eq!(view.iter().count(), 4);
    }

    #[test]
    fn test_json_shape() {
        let people = normalize(&sample());
        let json = serde_json::to_value(&people).unwrap();
        assert_eq!(json["0"]["contacts"]["H"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["3"]["industry_code"], serde_json::json!(42));
        assert!(json["0"].get("industry_code").is_none());
    }
}
