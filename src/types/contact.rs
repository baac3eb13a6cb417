//! Undirected contact relations.
//!
//! A [`ContactLayer`] is the only place contact sets are stored, and its
//! only mutators are [`ContactLayer::connect`] and [`ContactLayer::disconnect`],
//! which always touch both endpoints. Symmetry therefore holds after every
//! mutation without a separate repair pass.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::person::PersonId;

/// Undirected edge between two distinct individuals.
///
/// Stored in canonical form (`low < high`), so the derived `Ord`
/// gives a stable (low, high) ordering for export and hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContactEdge {
    /// Smaller endpoint.
    pub low: PersonId,
    /// Larger endpoint.
    pub high: PersonId,
}

impl ContactEdge {
    /// Create a canonical edge. Returns `None` for a self-contact.
    pub fn new(a: PersonId, b: PersonId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The endpoint opposite to `id`, if `id` is an endpoint.
    pub fn other(&self, id: PersonId) -> Option<PersonId> {
        if id == self.low {
            Some(self.high)
        } else if id == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

/// Symmetric adjacency for a single layer.
///
/// Uses BTreeMap/BTreeSet for deterministic iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactLayer {
    adjacency: BTreeMap<PersonId, BTreeSet<PersonId>>,
    edge_count: usize,
}

impl ContactLayer {
    /// Create an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an undirected contact between `a` and `b`.
    ///
    /// Returns `true` if the edge was new. Self-contacts are ignored and
    /// return `false`.
    pub fn connect(&mut self, a: PersonId, b: PersonId) -> bool {
        if a == b {
            return false;
        }
        let inserted = self.adjacency.entry(a).or_default().insert(b);
        if inserted {
            self.adjacency.entry(b).or_default().insert(a);
            self.edge_count += 1;
        }
        inserted
    }

    /// Remove the contact between `a` and `b` from both endpoints.
    ///
    /// Returns `true` if the edge existed.
    pub fn disconnect(&mut self, a: PersonId, b: PersonId) -> bool {
        let removed = match self.adjacency.get_mut(&a) {
            Some(set) => set.remove(&b),
            None => false,
        };
        if removed {
            if let Some(set) = self.adjacency.get_mut(&b) {
                set.remove(&a);
            }
            self.edge_count -= 1;
        }
        removed
    }

    /// Whether `a` and `b` are in contact.
    pub fn contains(&self, a: PersonId, b: PersonId) -> bool {
        self.adjacency.get(&a).map_or(false, |set| set.contains(&b))
    }

    /// Contacts of `id`, in ascending identifier order.
    pub fn contacts(&self, id: PersonId) -> impl Iterator<Item = PersonId> + '_ {
        self.adjacency.get(&id).into_iter().flat_map(|set| set.iter().copied())
    }

    /// Number of contacts of `id`.
    pub fn degree(&self, id: PersonId) -> usize {
        self.adjacency.get(&id).map_or(0, |set| set.len())
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether the layer has no edges.
    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    /// Individuals with at least one contact, ascending.
    pub fn members(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.adjacency
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(id, _)| *id)
    }

    /// Largest degree in the layer.
    pub fn max_degree(&self) -> usize {
        self.adjacency.values().map(|set| set.len()).max().unwrap_or(0)
    }

    /// All edges in canonical order.
    pub fn edges(&self) -> Vec<ContactEdge> {
        let mut edges = Vec::with_capacity(self.edge_count);
        for (id, set) in &self.adjacency {
            for other in set.range(*id..) {
                if other != id {
                    edges.push(ContactEdge { low: *id, high: *other });
                }
            }
        }
        edges
    }

    /// Check the symmetry invariant over the whole layer.
    ///
    /// Always true for layers built through `connect`/`disconnect`; exposed
    /// for validating data handed in from outside.
    pub fn is_symmetric(&self) -> bool {
        self.adjacency.iter().all(|(id, set)| {
            !set.contains(id) && set.iter().all(|other| self.contains(*other, *id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u32) -> PersonId {
        PersonId::new(id)
    }

    #[test]
    fn test_connect_registers_both_sides() {
        let mut layer = ContactLayer::new();
        assert!(layer.connect(p(1), p(2)));
        assert!(layer.contains(p(1), p(2)));
        assert!(layer.contains(p(2), p(1)));
        assert_eq!(layer.edge_count(), 1);

        // Duplicate in either direction is a no-op
        assert!(!layer.connect(p(2), p(1)));
        assert_eq!(layer.edge_count(), 1);
    }

    #[test]
    fn test_self_contact_rejected() {
        let mut layer = ContactLayer::new();
        assert!(!layer.connect(p(3), p(3)));
        assert_eq!(layer.degree(p(3)), 0);
        assert!(ContactEdge::new(p(3), p(3)).is_none());
    }

    #[test]
    fn test_disconnect_removes_both_sides() {
        let mut layer = ContactLayer::new();
        layer.connect(p(1), p(2));
        layer.connect(p(1), p(3));

        assert!(layer.disconnect(p(2), p(1)));
        assert!(!layer.contains(p(1), p(2)));
        assert!(!layer.contains(p(2), p(1)));
        assert_eq!(layer.degree(p(1)), 1);
        assert_eq!(layer.edge_count(), 1);
        assert!(!layer.disconnect(p(1), p(2)));
        assert!(layer.is_symmetric());
    }

    #[test]
    fn test_edges_canonical_order() {
        let mut layer = ContactLayer::new();
        layer.connect(p(5), p(1));
        layer.connect(p(3), p(2));
        layer.connect(p(1), p(2));

        let edges = layer.edges();
        assert_eq!(
            edges,
            vec![
                ContactEdge::new(p(1), p(2)).unwrap(),
                ContactEdge::new(p(1), p(5)).unwrap(),
                ContactEdge::new(p(2), p(3)).unwrap(),
            ]
        );
    }

    #[test]
    fn test_members_skip_emptied_sets() {
        let mut layer = ContactLayer::new();
        layer.connect(p(1), p(2));
        layer.disconnect(p(1), p(2));
        assert_eq!(layer.members().count(), 0);
        assert_eq!(layer.max_degree(), 0);
    }

    #[test]
    fn test_edge_other() {
        let edge = ContactEdge::new(p(9), p(4)).unwrap();
        assert_eq!(edge.low, p(4));
        assert_eq!(edge.other(p(4)), Some(p(9)));
        assert_eq!(edge.other(p(1)), None);
    }
}
