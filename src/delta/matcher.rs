//! Leaf matching between two subgraph snapshots.
//!
//! Leaves are grouped by their owning CS entity on each side independently;
//! for each CS entity present in either version the two leaf sets are
//! compared by structural key, and every leaf receives exactly one delta
//! classification. CS entities with no counterpart on the other side are
//! classified wholesale, with no per-leaf comparison.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DeltaState, LeafEntity, SubgraphSnapshot};

/// Per-leaf comparison result within a CS entity present in both versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafDelta {
    /// The classification. `Added` and `Deleted` carry one side only;
    /// `Modified` and `Unchanged` carry both.
    pub state: DeltaState,
    /// Structural key the leaves matched on.
    pub key: String,
    /// The version-A leaf, when present.
    pub a: Option<LeafEntity>,
    /// The version-B leaf, when present.
    pub b: Option<LeafEntity>,
}

/// Outcome for one CS entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityOutcome {
    /// Present only in version A: every leaf path is deleted.
    Deleted {
        /// The entity's version-A leaves.
        leaves: Vec<LeafEntity>,
    },
    /// Present only in version B: every leaf path is added.
    Added {
        /// The entity's version-B leaves.
        leaves: Vec<LeafEntity>,
    },
    /// Present in both versions; leaves compared individually.
    Compared {
        /// One delta per structural key.
        leaf_deltas: Vec<LeafDelta>,
    },
    /// The leaf set could not be resolved on at least one side. Explicitly
    /// distinct from `Compared` with unchanged leaves.
    Unresolved,
}

/// The full result of matching two snapshots, keyed by CS entity node id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaReport {
    /// Outcome per CS entity.
    pub entities: BTreeMap<u64, EntityOutcome>,
}

impl DeltaReport {
    /// Count leaves per delta state across all compared and wholesale
    /// entities.
    pub fn state_counts(&self) -> BTreeMap<DeltaState, usize> {
        let mut counts = BTreeMap::new();
        for outcome in self.entities.values() {
            match outcome {
                EntityOutcome::Deleted { leaves } => {
                    *counts.entry(DeltaState::Deleted).or_insert(0) += leaves.len();
                }
                EntityOutcome::Added { leaves } => {
                    *counts.entry(DeltaState::Added).or_insert(0) += leaves.len();
                }
                EntityOutcome::Compared { leaf_deltas } => {
                    for delta in leaf_deltas {
                        *counts.entry(delta.state).or_insert(0) += 1;
                    }
                }
                EntityOutcome::Unresolved => {}
            }
        }
        counts
    }

    /// Whether any entity was unresolved.
    pub fn has_unresolved(&self) -> bool {
        self.entities
            .values()
            .any(|outcome| matches!(outcome, EntityOutcome::Unresolved))
    }
}

/// Group leaves by their owning CS entity's node id.
pub fn group_by_entity(leaves: &[LeafEntity]) -> BTreeMap<u64, Vec<LeafEntity>> {
    let mut grouped: BTreeMap<u64, Vec<LeafEntity>> = BTreeMap::new();
    for leaf in leaves {
        grouped
            .entry(leaf.cs_entity.get())
            .or_default()
            .push(leaf.clone());
    }
    grouped
}

/// Match version A against version B.
///
/// Unresolved entities from either snapshot are carried into the report as
/// [`EntityOutcome::Unresolved`] and excluded from comparison.
pub fn match_versions(a: &SubgraphSnapshot, b: &SubgraphSnapshot) -> DeltaReport {
    let grouped_a = group_by_entity(&a.leaves);
    let grouped_b = group_by_entity(&b.leaves);

    let mut report = DeltaReport::default();

    for &unresolved in a.unresolved.iter().chain(&b.unresolved) {
        report.entities.insert(unresolved, EntityOutcome::Unresolved);
    }

    let entity_ids: std::collections::BTreeSet<u64> = grouped_a
        .keys()
        .chain(grouped_b.keys())
        .copied()
        .collect();

    for id in entity_ids {
        // An entity unresolved on one side is never half-compared.
        if report.entities.contains_key(&id) {
            continue;
        }
        let outcome = match (grouped_a.get(&id), grouped_b.get(&id)) {
            (Some(leaves_a), None) => EntityOutcome::Deleted {
                leaves: leaves_a.clone(),
            },
            (None, Some(leaves_b)) => EntityOutcome::Added {
                leaves: leaves_b.clone(),
            },
            (Some(leaves_a), Some(leaves_b)) => EntityOutcome::Compared {
                leaf_deltas: compare_leaves(leaves_a, leaves_b),
            },
            (None, None) => continue,
        };
        report.entities.insert(id, outcome);
    }

    tracing::debug!(
        entities = report.entities.len(),
        unresolved = report
            .entities
            .values()
            .filter(|o| matches!(o, EntityOutcome::Unresolved))
            .count(),
        "matched subgraph versions"
    );

    report
}

fn compare_leaves(leaves_a: &[LeafEntity], leaves_b: &[LeafEntity]) -> Vec<LeafDelta> {
    let by_key_a: BTreeMap<&str, &LeafEntity> =
        leaves_a.iter().map(|leaf| (leaf.key.as_str(), leaf)).collect();
    let by_key_b: BTreeMap<&str, &LeafEntity> =
        leaves_b.iter().map(|leaf| (leaf.key.as_str(), leaf)).collect();

    let keys: std::collections::BTreeSet<&str> =
        by_key_a.keys().chain(by_key_b.keys()).copied().collect();

    let mut deltas = Vec::with_capacity(keys.len());
    for key in keys {
        let delta = match (by_key_a.get(key), by_key_b.get(key)) {
            (Some(leaf_a), None) => LeafDelta {
                state: DeltaState::Deleted,
                key: key.to_owned(),
                a: Some((*leaf_a).clone()),
                b: None,
            },
            (None, Some(leaf_b)) => LeafDelta {
                state: DeltaState::Added,
                key: key.to_owned(),
                a: None,
                b: Some((*leaf_b).clone()),
            },
            (Some(leaf_a), Some(leaf_b)) => {
                let state = if leaf_a.value == leaf_b.value {
                    DeltaState::Unchanged
                } else {
                    DeltaState::Modified
                };
                LeafDelta {
                    state,
                    key: key.to_owned(),
                    a: Some((*leaf_a).clone()),
                    b: Some((*leaf_b).clone()),
                }
            }
            (None, None) => unreachable!("key came from one of the two maps"),
        };
        deltas.push(delta);
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn leaf(node: u64, cs: u64, key: &str, value: &str) -> LeafEntity {
        LeafEntity {
            node_id: NodeId::new(node).unwrap(),
            cs_entity: NodeId::new(cs).unwrap(),
            key: key.to_owned(),
            value: value.to_owned(),
        }
    }

    #[test]
    fn shared_entity_classifies_each_leaf_once() {
        // CS entity 1 with {a, b} in A and {b, c} in B.
        let a = SubgraphSnapshot::from_leaves(vec![
            leaf(10, 1, "pa", "a"),
            leaf(11, 1, "pb", "b"),
        ]);
        let b = SubgraphSnapshot::from_leaves(vec![
            leaf(20, 1, "pb", "b"),
            leaf(21, 1, "pc", "c"),
        ]);

        let report = match_versions(&a, &b);
        let EntityOutcome::Compared { leaf_deltas } = &report.entities[&1] else {
            panic!("expected compared outcome");
        };

        assert_eq!(leaf_deltas.len(), 3);
        let by_key: BTreeMap<&str, &LeafDelta> =
            leaf_deltas.iter().map(|d| (d.key.as_str(), d)).collect();
        assert_eq!(by_key["pa"].state, DeltaState::Deleted);
        assert_eq!(by_key["pb"].state, DeltaState::Unchanged);
        assert_eq!(by_key["pc"].state, DeltaState::Added);
    }

    #[test]
    fn content_change_is_modified() {
        let a = SubgraphSnapshot::from_leaves(vec![leaf(10, 1, "p", "old")]);
        let b = SubgraphSnapshot::from_leaves(vec![leaf(20, 1, "p", "new")]);

        let report = match_versions(&a, &b);
        let EntityOutcome::Compared { leaf_deltas } = &report.entities[&1] else {
            panic!("expected compared outcome");
        };
        assert_eq!(leaf_deltas.len(), 1);
        assert_eq!(leaf_deltas[0].state, DeltaState::Modified);
        assert!(leaf_deltas[0].a.is_some());
        assert!(leaf_deltas[0].b.is_some());
    }

    #[test]
    fn entity_only_in_a_is_wholly_deleted() {
        let a = SubgraphSnapshot::from_leaves(vec![
            leaf(10, 1, "p1", "x"),
            leaf(11, 1, "p2", "y"),
        ]);
        let b = SubgraphSnapshot::default();

        let report = match_versions(&a, &b);
        let EntityOutcome::Deleted { leaves } = &report.entities[&1] else {
            panic!("expected wholesale delete");
        };
        assert_eq!(leaves.len(), 2);
    }

    #[test]
    fn entity_only_in_b_is_wholly_added() {
        let a = SubgraphSnapshot::default();
        let b = SubgraphSnapshot::from_leaves(vec![leaf(20, 2, "p", "x")]);

        let report = match_versions(&a, &b);
        assert!(matches!(
            report.entities[&2],
            EntityOutcome::Added { .. }
        ));
    }

    #[test]
    fn unresolved_entity_is_never_compared() {
        let mut a = SubgraphSnapshot::from_leaves(vec![leaf(10, 1, "p", "x")]);
        a.unresolved.push(1);
        let b = SubgraphSnapshot::from_leaves(vec![leaf(20, 1, "p", "x")]);

        let report = match_versions(&a, &b);
        assert_eq!(report.entities[&1], EntityOutcome::Unresolved);
        assert!(report.has_unresolved());
    }

    #[test]
    fn state_counts_aggregate() {
        let a = SubgraphSnapshot::from_leaves(vec![
            leaf(10, 1, "pa", "a"),
            leaf(11, 1, "pb", "b"),
            leaf(12, 2, "p", "z"),
        ]);
        let b = SubgraphSnapshot::from_leaves(vec![
            leaf(20, 1, "pb", "b"),
            leaf(21, 1, "pc", "c"),
        ]);

        let report = match_versions(&a, &b);
        let counts = report.state_counts();
        assert_eq!(counts.get(&DeltaState::Deleted), Some(&2)); // pa + entity 2
        assert_eq!(counts.get(&DeltaState::Unchanged), Some(&1));
        assert_eq!(counts.get(&DeltaState::Added), Some(&1));
        assert_eq!(counts.get(&DeltaState::Modified), None);
    }

    #[test]
    fn grouping_is_per_entity() {
        let leaves = vec![
            leaf(10, 1, "p", "x"),
            leaf(11, 2, "p", "y"),
            leaf(12, 1, "q", "z"),
        ];
        let grouped = group_by_entity(&leaves);
        assert_eq!(grouped[&1].len(), 2);
        assert_eq!(grouped[&2].len(), 1);
    }
}
