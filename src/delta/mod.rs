//! Subgraph delta engine.
//!
//! Compares two versions of one logical resource's subgraph. Each version is
//! decomposed into composite-structure (CS) entities owning leaf entities;
//! [`matcher`] pairs the leaf sets and classifies every leaf, and [`mark`]
//! writes the classification onto every relationship along the path from the
//! CS entity root to the leaf, so a later full-path read recovers the diff
//! without recomputation.
//!
//! Matching across versions is structural-position-based: the same CS entity
//! node id is assumed comparable on both sides, and leaves correspond when
//! they sit on the same predicate path. This is a simplifying assumption of
//! the matching model, not a heuristic search.

pub mod mark;
pub mod matcher;

use serde::{Deserialize, Serialize};

use crate::error::DeltaError;
use crate::graph::{NodeId, PropertyGraph};
use crate::identity::{classify, identifier_of};

pub use mark::{apply_report, delta_state_of, mark_leaf_paths, mark_paths};
pub use matcher::{DeltaReport, EntityOutcome, LeafDelta, group_by_entity, match_versions};

/// Result type for delta operations.
pub type DeltaResult<T> = std::result::Result<T, DeltaError>;

/// Classification of a path between a CS entity and a leaf.
///
/// Computed per diff request and written as a relationship overlay; never
/// part of the primary statement model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeltaState {
    /// Present only in the newer version.
    Added,
    /// Present only in the older version.
    Deleted,
    /// Present in both versions with differing content.
    Modified,
    /// Present in both versions with equal content.
    Unchanged,
}

impl DeltaState {
    /// The tag written into the relationship overlay property.
    pub fn as_tag(self) -> &'static str {
        match self {
            DeltaState::Added => "ADDED",
            DeltaState::Deleted => "DELETED",
            DeltaState::Modified => "MODIFIED",
            DeltaState::Unchanged => "UNCHANGED",
        }
    }

    /// Parse a stored overlay tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ADDED" => Some(DeltaState::Added),
            "DELETED" => Some(DeltaState::Deleted),
            "MODIFIED" => Some(DeltaState::Modified),
            "UNCHANGED" => Some(DeltaState::Unchanged),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeltaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A terminal value node reachable from a CS entity, the finest unit of
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafEntity {
    /// The leaf node in its snapshot.
    pub node_id: NodeId,
    /// The owning composite entity's root node.
    pub cs_entity: NodeId,
    /// Structural position: the predicate path from the CS entity root.
    pub key: String,
    /// The leaf's content, compared for MODIFIED vs UNCHANGED.
    pub value: String,
}

/// One version's decomposition into leaf entities.
///
/// CS entities whose leaf set could not be resolved are listed separately;
/// they are excluded from comparison and reported as unresolved, never as
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubgraphSnapshot {
    /// All resolved leaf entities across all CS entities.
    pub leaves: Vec<LeafEntity>,
    /// CS entity node ids whose leaf set could not be resolved.
    pub unresolved: Vec<u64>,
}

impl SubgraphSnapshot {
    /// Snapshot from already-resolved leaves.
    pub fn from_leaves(leaves: Vec<LeafEntity>) -> Self {
        Self {
            leaves,
            unresolved: Vec::new(),
        }
    }
}

/// Decompose the subgraphs rooted at the given CS entities into a snapshot.
///
/// Per-entity resolution failures (missing root, no reachable leaves, a leaf
/// whose identity cannot be derived) put the entity on the unresolved list
/// and do not abort the snapshot; substrate failures propagate.
pub fn resolve_snapshot(
    graph: &PropertyGraph,
    cs_entities: &[NodeId],
) -> DeltaResult<SubgraphSnapshot> {
    let mut snapshot = SubgraphSnapshot::default();

    for &root in cs_entities {
        if !graph.has_node(root) {
            tracing::warn!(cs_entity = root.get(), "composite entity missing from snapshot");
            snapshot.unresolved.push(root.get());
            continue;
        }
        match resolve_leaves(graph, root) {
            Ok(mut leaves) => snapshot.leaves.append(&mut leaves),
            Err(DeltaError::UnresolvedEntity { cs_entity_id }) => {
                tracing::warn!(cs_entity = cs_entity_id, "leaf set could not be resolved");
                snapshot.unresolved.push(cs_entity_id);
            }
            Err(other) => return Err(other),
        }
    }

    Ok(snapshot)
}

/// Collect the leaf entities reachable from one CS entity root.
pub fn resolve_leaves(graph: &PropertyGraph, root: NodeId) -> DeltaResult<Vec<LeafEntity>> {
    let out = graph.outgoing(root)?;
    if out.is_empty() {
        return Err(DeltaError::UnresolvedEntity {
            cs_entity_id: root.get(),
        });
    }

    let mut leaves = Vec::new();
    let mut path = Vec::new();
    let mut on_path = std::collections::HashSet::from([root]);
    collect_leaves(graph, root, root, &mut path, &mut on_path, &mut leaves)?;
    Ok(leaves)
}

fn collect_leaves(
    graph: &PropertyGraph,
    cs_root: NodeId,
    node: NodeId,
    path: &mut Vec<String>,
    on_path: &mut std::collections::HashSet<NodeId>,
    leaves: &mut Vec<LeafEntity>,
) -> DeltaResult<()> {
    let out = graph.outgoing(node)?;

    if out.is_empty() {
        leaves.push(LeafEntity {
            node_id: node,
            cs_entity: cs_root,
            key: path.join("/"),
            value: leaf_value(graph, cs_root, node)?,
        });
        return Ok(());
    }

    for rel in out {
        // Cycle guard: a node already on the current path is not revisited.
        if on_path.contains(&rel.target) {
            continue;
        }
        on_path.insert(rel.target);
        path.push(rel.predicate.clone());
        collect_leaves(graph, cs_root, rel.target, path, on_path, leaves)?;
        path.pop();
        on_path.remove(&rel.target);
    }
    Ok(())
}

fn leaf_value(graph: &PropertyGraph, cs_root: NodeId, node: NodeId) -> DeltaResult<String> {
    let kind = classify(graph, node).map_err(|_| DeltaError::UnresolvedEntity {
        cs_entity_id: cs_root.get(),
    })?;
    identifier_of(graph, node, kind).ok_or(DeltaError::UnresolvedEntity {
        cs_entity_id: cs_root.get(),
    })
}
