//! Path marking: writing delta classifications onto stored relationships.
//!
//! Marking walks from a CS entity root to a set of leaf end-nodes and writes
//! the delta state onto every relationship along each root-to-leaf path.
//! Shared path prefixes can serve leaves with different states; change marks
//! (added, deleted, modified) win over unchanged on shared segments, which
//! [`apply_report`] guarantees by marking unchanged paths first.

use std::collections::{HashMap, HashSet};

use crate::error::DeltaError;
use crate::graph::{NodeId, PropertyGraph, RelId, props};

use super::matcher::{DeltaReport, EntityOutcome};
use super::{DeltaResult, DeltaState, LeafEntity};

/// Read the delta overlay of a relationship, if one was written.
pub fn delta_state_of(graph: &PropertyGraph, rel: RelId) -> DeltaResult<Option<DeltaState>> {
    Ok(graph
        .rel_property(rel, props::DELTA_STATE)?
        .and_then(|value| value.as_str().and_then(DeltaState::from_tag)))
}

/// Mark every relationship on the paths from `root` to each node in
/// `leaf_ids` with the given state.
///
/// Fails with [`DeltaError::NoPath`] when some leaf is not reachable from
/// the root; already-written marks from the same call are kept, consistent
/// with the no-mid-batch-rollback policy of the store.
pub fn mark_paths(
    graph: &PropertyGraph,
    state: DeltaState,
    root: NodeId,
    leaf_ids: &HashSet<NodeId>,
) -> DeltaResult<()> {
    let mut reached = HashSet::new();
    let mut rel_path = Vec::new();
    let mut on_path = HashSet::from([root]);
    walk_and_mark(
        graph,
        state,
        root,
        leaf_ids,
        &mut rel_path,
        &mut on_path,
        &mut reached,
    )?;

    for leaf in leaf_ids {
        if !reached.contains(leaf) {
            return Err(DeltaError::NoPath {
                root_id: root.get(),
                leaf_id: leaf.get(),
            });
        }
    }
    Ok(())
}

fn walk_and_mark(
    graph: &PropertyGraph,
    state: DeltaState,
    node: NodeId,
    leaf_ids: &HashSet<NodeId>,
    rel_path: &mut Vec<RelId>,
    on_path: &mut HashSet<NodeId>,
    reached: &mut HashSet<NodeId>,
) -> DeltaResult<()> {
    if leaf_ids.contains(&node) {
        reached.insert(node);
        for &rel in rel_path.iter() {
            graph.set_rel_property(rel, props::DELTA_STATE, state.as_tag())?;
        }
    }

    for rel in graph.outgoing(node)? {
        if on_path.contains(&rel.target) {
            continue;
        }
        on_path.insert(rel.target);
        rel_path.push(rel.rel_id);
        walk_and_mark(graph, state, rel.target, leaf_ids, rel_path, on_path, reached)?;
        rel_path.pop();
        on_path.remove(&rel.target);
    }
    Ok(())
}

/// Mark the paths of a collection of leaf entities with one state.
///
/// Leaves are grouped by their owning CS entity and each group is marked
/// from that entity's root.
pub fn mark_leaf_paths(
    graph: &PropertyGraph,
    state: DeltaState,
    leaves: &[LeafEntity],
) -> DeltaResult<()> {
    let mut end_nodes_by_entity: HashMap<NodeId, HashSet<NodeId>> = HashMap::new();
    for leaf in leaves {
        end_nodes_by_entity
            .entry(leaf.cs_entity)
            .or_default()
            .insert(leaf.node_id);
    }

    for (root, leaf_ids) in &end_nodes_by_entity {
        mark_paths(graph, state, *root, leaf_ids)?;
    }
    Ok(())
}

/// Write a whole delta report onto the two snapshots' graphs.
///
/// Deleted paths are marked in version A's graph, added paths in version
/// B's, and paths present in both versions are marked on both sides.
/// Unresolved entities are left unmarked.
pub fn apply_report(
    graph_a: &PropertyGraph,
    graph_b: &PropertyGraph,
    report: &DeltaReport,
) -> DeltaResult<()> {
    // Unchanged first so change marks win on shared path prefixes.
    for pass_state in [
        DeltaState::Unchanged,
        DeltaState::Modified,
        DeltaState::Deleted,
        DeltaState::Added,
    ] {
        for outcome in report.entities.values() {
            match outcome {
                EntityOutcome::Deleted { leaves } if pass_state == DeltaState::Deleted => {
                    mark_leaf_paths(graph_a, DeltaState::Deleted, leaves)?;
                }
                EntityOutcome::Added { leaves } if pass_state == DeltaState::Added => {
                    mark_leaf_paths(graph_b, DeltaState::Added, leaves)?;
                }
                EntityOutcome::Compared { leaf_deltas } => {
                    for delta in leaf_deltas {
                        if delta.state != pass_state {
                            continue;
                        }
                        if let Some(leaf_a) = &delta.a {
                            mark_leaf_paths(graph_a, delta.state, std::slice::from_ref(leaf_a))?;
                        }
                        if let Some(leaf_b) = &delta.b {
                            mark_leaf_paths(graph_b, delta.state, std::slice::from_ref(leaf_b))?;
                        }
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropValue;
    use crate::identity::NodeKind;

    fn literal(graph: &PropertyGraph, value: &str) -> NodeId {
        graph
            .create_node([
                (
                    props::NODE_KIND.to_owned(),
                    PropValue::from(NodeKind::Literal.as_tag()),
                ),
                (props::VALUE.to_owned(), PropValue::from(value)),
            ])
            .unwrap()
    }

    fn bnode(graph: &PropertyGraph) -> NodeId {
        graph
            .create_node([(
                props::NODE_KIND.to_owned(),
                PropValue::from(NodeKind::BNode.as_tag()),
            )])
            .unwrap()
    }

    #[test]
    fn marks_every_relationship_on_the_path() {
        let graph = PropertyGraph::new();
        let root = bnode(&graph);
        let mid = bnode(&graph);
        let leaf = literal(&graph, "x");
        let r1 = graph.create_relationship(root, mid, "p1", []).unwrap();
        let r2 = graph.create_relationship(mid, leaf, "p2", []).unwrap();

        mark_paths(
            &graph,
            DeltaState::Added,
            root,
            &HashSet::from([leaf]),
        )
        .unwrap();

        assert_eq!(delta_state_of(&graph, r1).unwrap(), Some(DeltaState::Added));
        assert_eq!(delta_state_of(&graph, r2).unwrap(), Some(DeltaState::Added));
    }

    #[test]
    fn only_target_leaf_paths_are_marked() {
        let graph = PropertyGraph::new();
        let root = bnode(&graph);
        let wanted = literal(&graph, "x");
        let other = literal(&graph, "y");
        let r1 = graph.create_relationship(root, wanted, "p1", []).unwrap();
        let r2 = graph.create_relationship(root, other, "p2", []).unwrap();

        mark_paths(
            &graph,
            DeltaState::Deleted,
            root,
            &HashSet::from([wanted]),
        )
        .unwrap();

        assert_eq!(delta_state_of(&graph, r1).unwrap(), Some(DeltaState::Deleted));
        assert_eq!(delta_state_of(&graph, r2).unwrap(), None);
    }

    #[test]
    fn unreachable_leaf_is_an_error() {
        let graph = PropertyGraph::new();
        let root = bnode(&graph);
        let leaf = literal(&graph, "x");
        graph.create_relationship(root, leaf, "p", []).unwrap();
        let stranded = literal(&graph, "z");

        let err = mark_paths(
            &graph,
            DeltaState::Added,
            root,
            &HashSet::from([leaf, stranded]),
        )
        .unwrap_err();
        assert!(matches!(err, DeltaError::NoPath { .. }));
    }

    #[test]
    fn mark_leaf_paths_groups_by_entity() {
        let graph = PropertyGraph::new();
        let root_a = bnode(&graph);
        let root_b = bnode(&graph);
        let leaf_a = literal(&graph, "x");
        let leaf_b = literal(&graph, "y");
        let r1 = graph.create_relationship(root_a, leaf_a, "p", []).unwrap();
        let r2 = graph.create_relationship(root_b, leaf_b, "p", []).unwrap();

        let leaves = vec![
            LeafEntity {
                node_id: leaf_a,
                cs_entity: root_a,
                key: "p".into(),
                value: "x".into(),
            },
            LeafEntity {
                node_id: leaf_b,
                cs_entity: root_b,
                key: "p".into(),
                value: "y".into(),
            },
        ];
        mark_leaf_paths(&graph, DeltaState::Deleted, &leaves).unwrap();

        assert_eq!(delta_state_of(&graph, r1).unwrap(), Some(DeltaState::Deleted));
        assert_eq!(delta_state_of(&graph, r2).unwrap(), Some(DeltaState::Deleted));
    }

    #[test]
    fn change_marks_win_on_shared_prefix() {
        // root -> mid -> {kept, gone}; the prefix relationship serves both an
        // unchanged and a deleted leaf and must end up marked as the change.
        let graph = PropertyGraph::new();
        let root = bnode(&graph);
        let mid = bnode(&graph);
        let kept = literal(&graph, "kept");
        let gone = literal(&graph, "gone");
        let prefix = graph.create_relationship(root, mid, "p", []).unwrap();
        graph.create_relationship(mid, kept, "k", []).unwrap();
        graph.create_relationship(mid, gone, "g", []).unwrap();

        let unchanged_leaf = LeafEntity {
            node_id: kept,
            cs_entity: root,
            key: "p/k".into(),
            value: "kept".into(),
        };
        let deleted_leaf = LeafEntity {
            node_id: gone,
            cs_entity: root,
            key: "p/g".into(),
            value: "gone".into(),
        };

        mark_leaf_paths(&graph, DeltaState::Unchanged, std::slice::from_ref(&unchanged_leaf))
            .unwrap();
        mark_leaf_paths(&graph, DeltaState::Deleted, std::slice::from_ref(&deleted_leaf))
            .unwrap();

        assert_eq!(
            delta_state_of(&graph, prefix).unwrap(),
            Some(DeltaState::Deleted)
        );
    }
}
