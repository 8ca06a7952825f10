//! End-to-end delta scenarios over two stored subgraph versions.

use std::collections::BTreeMap;

use terngraph::delta::{
    DeltaState, EntityOutcome, apply_report, delta_state_of, match_versions, resolve_snapshot,
};
use terngraph::graph::{NodeId, PropValue, PropertyGraph, RelId, props};
use terngraph::identity::NodeKind;

fn bnode(graph: &PropertyGraph) -> NodeId {
    graph
        .create_node([(
            props::NODE_KIND.to_owned(),
            PropValue::from(NodeKind::BNode.as_tag()),
        )])
        .unwrap()
}

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

fn attach(graph: &PropertyGraph, from: NodeId, to: NodeId, predicate: &str) -> RelId {
    graph.create_relationship(from, to, predicate, []).unwrap()
}

/// Composite entity with leaves {a, b} in version A and {b, c} in version B:
/// a's path is DELETED, c's path is ADDED, b's path is UNCHANGED, and the
/// outcomes are mutually exclusive per leaf.
#[test]
fn added_deleted_unchanged_are_mutually_exclusive() {
    let graph_a = PropertyGraph::new();
    let root_a = bnode(&graph_a);
    let leaf_a = literal(&graph_a, "a");
    let leaf_b = literal(&graph_a, "b");
    let rel_pa = attach(&graph_a, root_a, leaf_a, "pa");
    let rel_pb_a = attach(&graph_a, root_a, leaf_b, "pb");

    let graph_b = PropertyGraph::new();
    let root_b = bnode(&graph_b);
    assert_eq!(root_a, root_b, "structural anchor must align across versions");
    let leaf_b2 = literal(&graph_b, "b");
    let leaf_c = literal(&graph_b, "c");
    let rel_pb_b = attach(&graph_b, root_b, leaf_b2, "pb");
    let rel_pc = attach(&graph_b, root_b, leaf_c, "pc");

    let snapshot_a = resolve_snapshot(&graph_a, &[root_a]).unwrap();
    let snapshot_b = resolve_snapshot(&graph_b, &[root_b]).unwrap();
    let report = match_versions(&snapshot_a, &snapshot_b);

    let EntityOutcome::Compared { leaf_deltas } = &report.entities[&root_a.get()] else {
        panic!("expected per-leaf comparison");
    };
    let states: BTreeMap<&str, DeltaState> = leaf_deltas
        .iter()
        .map(|d| (d.key.as_str(), d.state))
        .collect();
    assert_eq!(states["pa"], DeltaState::Deleted);
    assert_eq!(states["pb"], DeltaState::Unchanged);
    assert_eq!(states["pc"], DeltaState::Added);
    assert_eq!(leaf_deltas.len(), 3, "each leaf gets exactly one outcome");

    apply_report(&graph_a, &graph_b, &report).unwrap();

    assert_eq!(
        delta_state_of(&graph_a, rel_pa).unwrap(),
        Some(DeltaState::Deleted)
    );
    assert_eq!(
        delta_state_of(&graph_a, rel_pb_a).unwrap(),
        Some(DeltaState::Unchanged)
    );
    assert_eq!(
        delta_state_of(&graph_b, rel_pb_b).unwrap(),
        Some(DeltaState::Unchanged)
    );
    assert_eq!(
        delta_state_of(&graph_b, rel_pc).unwrap(),
        Some(DeltaState::Added)
    );
}

/// A content change on the same structural position is MODIFIED on both
/// sides.
#[test]
fn content_change_marks_modified() {
    let graph_a = PropertyGraph::new();
    let root_a = bnode(&graph_a);
    let old = literal(&graph_a, "old title");
    let rel_a = attach(&graph_a, root_a, old, "title");

    let graph_b = PropertyGraph::new();
    let root_b = bnode(&graph_b);
    let new = literal(&graph_b, "new title");
    let rel_b = attach(&graph_b, root_b, new, "title");

    let report = match_versions(
        &resolve_snapshot(&graph_a, &[root_a]).unwrap(),
        &resolve_snapshot(&graph_b, &[root_b]).unwrap(),
    );
    apply_report(&graph_a, &graph_b, &report).unwrap();

    assert_eq!(
        delta_state_of(&graph_a, rel_a).unwrap(),
        Some(DeltaState::Modified)
    );
    assert_eq!(
        delta_state_of(&graph_b, rel_b).unwrap(),
        Some(DeltaState::Modified)
    );
}

/// A composite entity present only in one version is classified wholesale;
/// no per-leaf comparison happens.
#[test]
fn lone_entity_is_marked_wholesale() {
    let graph_a = PropertyGraph::new();
    let root_a = bnode(&graph_a);
    let x = literal(&graph_a, "x");
    let y = literal(&graph_a, "y");
    let rel_x = attach(&graph_a, root_a, x, "px");
    let rel_y = attach(&graph_a, root_a, y, "py");

    let graph_b = PropertyGraph::new();
    // Burn the anchor id so version B has a disjoint entity.
    let _ = bnode(&graph_b);
    let root_b = bnode(&graph_b);
    let z = literal(&graph_b, "z");
    let rel_z = attach(&graph_b, root_b, z, "pz");

    let report = match_versions(
        &resolve_snapshot(&graph_a, &[root_a]).unwrap(),
        &resolve_snapshot(&graph_b, &[root_b]).unwrap(),
    );

    let EntityOutcome::Deleted { leaves } = &report.entities[&root_a.get()] else {
        panic!("entity only in A must be wholly deleted");
    };
    assert_eq!(leaves.len(), 2);
    assert!(matches!(
        report.entities[&root_b.get()],
        EntityOutcome::Added { .. }
    ));

    apply_report(&graph_a, &graph_b, &report).unwrap();
    assert_eq!(
        delta_state_of(&graph_a, rel_x).unwrap(),
        Some(DeltaState::Deleted)
    );
    assert_eq!(
        delta_state_of(&graph_a, rel_y).unwrap(),
        Some(DeltaState::Deleted)
    );
    assert_eq!(
        delta_state_of(&graph_b, rel_z).unwrap(),
        Some(DeltaState::Added)
    );
}

/// Multi-hop paths are marked over their full length, so reading any path
/// recovers the diff without recomputation.
#[test]
fn deep_paths_are_marked_end_to_end() {
    let graph_a = PropertyGraph::new();
    let root_a = bnode(&graph_a);
    let mid_a = bnode(&graph_a);
    let leaf_a = literal(&graph_a, "v");
    let hop1_a = attach(&graph_a, root_a, mid_a, "part");
    let hop2_a = attach(&graph_a, mid_a, leaf_a, "value");

    let graph_b = PropertyGraph::new();
    let root_b = bnode(&graph_b);
    let mid_b = bnode(&graph_b);
    let leaf_b = literal(&graph_b, "w");
    let hop1_b = attach(&graph_b, root_b, mid_b, "part");
    let hop2_b = attach(&graph_b, mid_b, leaf_b, "value");

    let report = match_versions(
        &resolve_snapshot(&graph_a, &[root_a]).unwrap(),
        &resolve_snapshot(&graph_b, &[root_b]).unwrap(),
    );
    apply_report(&graph_a, &graph_b, &report).unwrap();

    for rel in [hop1_a, hop2_a] {
        assert_eq!(
            delta_state_of(&graph_a, rel).unwrap(),
            Some(DeltaState::Modified)
        );
    }
    for rel in [hop1_b, hop2_b] {
        assert_eq!(
            delta_state_of(&graph_b, rel).unwrap(),
            Some(DeltaState::Modified)
        );
    }
}

/// An entity whose leaf set cannot be resolved is surfaced as unresolved,
/// never silently folded into UNCHANGED.
#[test]
fn unresolved_entity_is_distinguishable() {
    let graph_a = PropertyGraph::new();
    let root_a = bnode(&graph_a); // childless on purpose

    let graph_b = PropertyGraph::new();
    let root_b = bnode(&graph_b);
    let leaf = literal(&graph_b, "x");
    attach(&graph_b, root_b, leaf, "p");

    let snapshot_a = resolve_snapshot(&graph_a, &[root_a]).unwrap();
    assert_eq!(snapshot_a.unresolved, vec![root_a.get()]);

    let report = match_versions(&snapshot_a, &resolve_snapshot(&graph_b, &[root_b]).unwrap());
    assert_eq!(report.entities[&root_a.get()], EntityOutcome::Unresolved);
    assert!(report.has_unresolved());

    let counts = report.state_counts();
    assert_eq!(counts.get(&DeltaState::Unchanged), None);
}
