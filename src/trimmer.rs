//! Degree trimming.
//!
//! Reduces each targeted layer so that no individual has more contacts
//! than the layer's cap. Only removes edges, never adds them.
//!
//! ## Algorithm (per targeted layer)
//!
//! 1. Visit members in ascending `PersonId` order
//! 2. If the member's *current* degree exceeds the cap, sample
//!    `degree - cap` of its contacts uniformly without replacement
//! 3. Remove each sampled edge from both endpoints in one operation
//!
//! The degree check happens at visit time. A removal made while visiting a
//! later member may push an already-visited neighbor further below the cap;
//! nobody is revisited, and every member ends at or below the cap because
//! degrees only decrease.
//!
//! ## Determinism
//!
//! Each layer draws from its own RNG seeded from the trimmer seed and the
//! layer code, so results are reproducible and independent of which other
//! layers are trimmed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::config::DegreeCaps;
use crate::types::{ContactLayer, Layer, PersonId, Population};

/// Outcome of trimming one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTrimStats {
    /// Trimmed layer.
    pub layer: Layer,
    /// Cap applied.
    pub cap: u32,
    /// Members whose degree exceeded the cap at visit time.
    pub people_trimmed: usize,
    /// Undirected edges removed.
    pub edges_removed: usize,
    /// Largest degree before trimming.
    pub max_degree_before: usize,
    /// Largest degree after trimming.
    pub max_degree_after: usize,
}

/// Outcome of a trimming pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimReport {
    /// Per-layer statistics, in canonical layer order.
    pub layers: Vec<LayerTrimStats>,
}

impl TrimReport {
    /// Total undirected edges removed.
    pub fn edges_removed(&self) -> usize {
        self.layers.iter().map(|s| s.edges_removed).sum()
    }

    /// Whether the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.edges_removed() == 0
    }

    /// Statistics for one layer.
    pub fn layer(&self, layer: Layer) -> Option<&LayerTrimStats> {
        self.layers.iter().find(|s| s.layer == layer)
    }
}

/// Seeded degree trimmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreeTrimmer {
    seed: u64,
}

impl DegreeTrimmer {
    /// Create a trimmer.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed in use.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Trim every layer named in `caps`, in place.
    ///
    /// Layers absent from the population are skipped; layers not named in
    /// `caps` are untouched.
    pub fn trim(&self, population: &mut Population, caps: &DegreeCaps) -> TrimReport {
        let mut report = TrimReport::default();
        for (layer, cap) in caps.iter() {
            let Some(contacts) = population.layer_mut(layer) else {
                tracing::debug!(layer = %layer, "Layer absent, nothing to trim");
                continue;
            };
            let stats = self.trim_layer(layer, contacts, cap);
            tracing::debug!(
                layer = %layer,
                cap = cap,
                people_trimmed = stats.people_trimmed,
                edges_removed = stats.edges_removed,
                max_degree_before = stats.max_degree_before,
                max_degree_after = stats.max_degree_after,
                "Layer trimmed"
            );
            report.layers.push(stats);
        }
        report
    }

    /// Trim a single layer to `cap`; `cap` comes from a validated [`DegreeCaps`].
    fn trim_layer(&self, layer: Layer, contacts: &mut ContactLayer, cap: u32) -> LayerTrimStats {
        let cap = cap as usize;
        let mut rng = self.layer_rng(layer);
        let max_degree_before = contacts.max_degree();

        let mut people_trimmed = 0;
        let mut edges_removed = 0;

        let members: Vec<PersonId> = contacts.members().collect();
        for id in members {
            let degree = contacts.degree(id);
            if degree <= cap {
                continue;
            }
            let current: Vec<PersonId> = contacts.contacts(id).collect();
            let dropped: Vec<PersonId> = current
                .choose_multiple(&mut rng, degree - cap)
                .copied()
                .collect();
            for other in dropped {
                if contacts.disconnect(id, other) {
                    edges_removed += 1;
                }
            }
            people_trimmed += 1;
        }

        LayerTrimStats {
            layer,
            cap: cap as u32,
            people_trimmed,
            edges_removed,
            max_degree_before,
            max_degree_after: contacts.max_degree(),
        }
    }

    fn layer_rng(&self, layer: Layer) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ xxh64(layer.code().as_bytes(), 0))
    }
}

/// Re-trim an already assembled population without re-running assembly.
///
/// Deterministic for a given population, caps and seed; a second call with
/// the same caps on its own output changes nothing.
pub fn trim_population(population: &mut Population, caps: &DegreeCaps, seed: u64) -> TrimReport {
    DegreeTrimmer::new(seed).trim(population, caps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::types::{Location, Person, PopulationParams, PopulationSource, Sex};

    fn p(id: u32) -> PersonId {
        PersonId::new(id)
    }

    fn empty_population(n: u32) -> Population {
        let mut population = Population::new(PopulationParams::new(
            n as usize,
            Location::default(),
            PopulationSource::Synthesized,
        ));
        for i in 0..n {
            population.add_person(Person::new(p(i), 30, Sex::Female)).unwrap();
        }
        population
    }

    fn clique(population: &mut Population, layer: Layer, ids: std::ops::Range<u32>) {
        for a in ids.clone() {
            for b in (a + 1)..ids.end {
                population.connect(layer, p(a), p(b)).unwrap();
            }
        }
    }

    fn caps(pairs: &[(Layer, i64)]) -> DegreeCaps {
        pairs
            .iter()
            .try_fold(DegreeCaps::empty(), |caps, (layer, cap)| caps.with(*layer, *cap))
            .unwrap()
    }

    #[test]
    fn test_star_center_trimmed_to_cap() {
        let mut population = empty_population(11);
        for leaf in 1..11 {
            population.connect(Layer::School, p(0), p(leaf)).unwrap();
        }

        let report = trim_population(&mut population, &caps(&[(Layer::School, 3)]), 7);

        assert_eq!(population.degree(Layer::School, p(0)), 3);
        assert_eq!(report.edges_removed(), 7);
        let stats = report.layer(Layer::School).unwrap();
        assert_eq!(stats.people_trimmed, 1);
        assert_eq!(stats.max_degree_before, 10);
        assert_eq!(stats.max_degree_after, 3);
        assert!(population.is_symmetric());
    }

    #[test]
    fn test_clique_all_within_cap() {
        let mut population = empty_population(40);
        clique(&mut population, Layer::Work, 0..40);

        trim_population(&mut population, &caps(&[(Layer::Work, 5)]), 1);

        for i in 0..40 {
            assert!(population.degree(Layer::Work, p(i)) <= 5);
        }
        assert!(population.is_symmetric());
    }

    #[test]
    fn test_untargeted_layers_untouched() {
        let mut population = empty_population(30);
        clique(&mut population, Layer::Household, 0..30);
        clique(&mut population, Layer::School, 0..30);
        let household_before = population.layer(Layer::Household).unwrap().clone();

        let report = trim_population(&mut population, &caps(&[(Layer::School, 2)]), 3);

        assert_eq!(population.layer(Layer::Household).unwrap(), &household_before);
        assert!(report.layer(Layer::Household).is_none());
    }

    #[test]
    fn test_absent_layer_skipped() {
        let mut population = empty_population(3);
        let report = trim_population(&mut population, &DegreeCaps::defaults(), 0);
        assert!(report.layers.is_empty());
        assert!(report.is_noop());
    }

    #[test]
    fn test_idempotent() {
        let mut population = empty_population(50);
        clique(&mut population, Layer::School, 0..50);
        let caps = caps(&[(Layer::School, 4)]);

        trim_population(&mut population, &caps, 11);
        let after_first = population.clone();
        let second = trim_population(&mut population, &caps, 99);

        assert!(second.is_noop());
        assert_eq!(population, after_first);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let mut base = empty_population(30);
        clique(&mut base, Layer::Work, 0..30);
        let caps = caps(&[(Layer::Work, 3)]);

        let mut a = base.clone();
        let mut b = base.clone();
        trim_population(&mut a, &caps, 5);
        trim_population(&mut b, &caps, 5);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_selection_is_randomized() {
        let mut base = empty_population(30);
        for leaf in 1..30 {
            base.connect(Layer::School, p(0), p(leaf)).unwrap();
        }
        let caps = caps(&[(Layer::School, 5)]);

        let survivors: std::collections::BTreeSet<Vec<PersonId>> = (0..8)
            .map(|seed| {
                let mut population = base.clone();
                trim_population(&mut population, &caps, seed);
                population.layer(Layer::School).unwrap().contacts(p(0)).collect()
            })
            .collect();
        assert!(survivors.len() > 1);
    }

    #[test]
    fn test_zero_cap_rejected_before_trimming() {
        let mut population = empty_population(6);
        for leaf in 1..6 {
            population.connect(Layer::School, p(0), p(leaf)).unwrap();
        }
        let before = population.clone();

        let err = DegreeCaps::empty().with(Layer::School, 0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDegreeCap { value: 0, .. }));

        let report = trim_population(&mut population, &caps(&[(Layer::School, 1)]), 0);
        assert_eq!(report.edges_removed(), 4);
        assert_eq!(population.degree(Layer::School, p(0)), 1);
        assert_ne!(population, before);
    }

    #[test]
    fn test_compliant_people_left_alone() {
        let mut population = empty_population(4);
        population.connect(Layer::School, p(0), p(1)).unwrap();
        population.connect(Layer::School, p(2), p(3)).unwrap();
        let before = population.clone();

        let report = trim_population(&mut population, &caps(&[(Layer::School, 1)]), 0);

        assert!(report.is_noop());
        assert_eq!(report.layer(Layer::School).unwrap().people_trimmed, 0);
        assert_eq!(population, before);
    }
}
