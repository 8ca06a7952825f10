//! Embedded property-graph substrate.
//!
//! Nodes carry a property bag and labels; relationships carry a predicate
//! (their type) and a property bag. The structure is backed by `petgraph`
//! with `DashMap` side-indexes for O(1) lookups by stable [`NodeId`]/[`RelId`],
//! mirroring a batch-inserter storage engine: nodes and relationships are
//! never removed, only created and annotated.
//!
//! The rest of the crate consumes exactly the primitives defined here:
//! create node, create relationship, get/set properties, add a label, and
//! traverse outgoing relationships.

pub mod props;

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Result type for substrate operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Stable node identifier, allocated per store starting at 1.
///
/// Uses `NonZeroU64` so that `Option<NodeId>` is the same size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(NonZeroU64);

impl NodeId {
    /// Create a `NodeId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(NodeId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n:{}", self.0)
    }
}

/// Stable relationship identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RelId(NonZeroU64);

impl RelId {
    /// Create a `RelId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(RelId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for RelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r:{}", self.0)
    }
}

/// A property value stored on a node or relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    /// UTF-8 string value.
    Str(String),
    /// Signed integer value (ordinals, indices).
    Int(i64),
    /// Unsigned integer value (hashes, version bounds).
    Uint(u64),
}

impl PropValue {
    /// Borrow the string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the signed integer value, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the unsigned integer value, if this is an unsigned integer.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            PropValue::Uint(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Str(s.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Str(s)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Int(v)
    }
}

impl From<u64> for PropValue {
    fn from(v: u64) -> Self {
        PropValue::Uint(v)
    }
}

/// Node payload: property bag plus labels.
#[derive(Debug, Clone)]
struct NodeRecord {
    id: NodeId,
    properties: HashMap<String, PropValue>,
    labels: Vec<String>,
}

/// Relationship payload: predicate (the relationship type) plus property bag.
#[derive(Debug, Clone)]
struct RelRecord {
    id: RelId,
    predicate: String,
    properties: HashMap<String, PropValue>,
}

/// Lightweight view of an outgoing relationship, for traversals.
#[derive(Debug, Clone, PartialEq)]
pub struct RelRef {
    /// The relationship id.
    pub rel_id: RelId,
    /// The predicate URI (relationship type).
    pub predicate: String,
    /// The relationship's target node.
    pub target: NodeId,
}

/// Thread-safe id allocator producing monotonically increasing ids from 1.
#[derive(Debug)]
struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    fn next_raw(&self) -> GraphResult<NonZeroU64> {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        NonZeroU64::new(raw).ok_or(GraphError::AllocatorExhausted)
    }
}

/// Embedded property graph with stable external ids.
///
/// Append-only by design: the import path creates nodes and relationships
/// and annotates them, never deletes. This keeps petgraph indexes valid for
/// the lifetime of the store.
pub struct PropertyGraph {
    graph: RwLock<DiGraph<NodeRecord, RelRecord>>,
    node_index: DashMap<NodeId, NodeIndex>,
    rel_index: DashMap<RelId, EdgeIndex>,
    node_ids: IdAllocator,
    rel_ids: IdAllocator,
}

impl PropertyGraph {
    /// Create a new empty property graph.
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(DiGraph::new()),
            node_index: DashMap::new(),
            rel_index: DashMap::new(),
            node_ids: IdAllocator::new(),
            rel_ids: IdAllocator::new(),
        }
    }

    /// Create a node with the given properties, returning its id.
    pub fn create_node(
        &self,
        properties: impl IntoIterator<Item = (String, PropValue)>,
    ) -> GraphResult<NodeId> {
        let id = NodeId(self.node_ids.next_raw()?);
        let record = NodeRecord {
            id,
            properties: properties.into_iter().collect(),
            labels: Vec::new(),
        };
        let mut graph = self.graph.write().expect("graph lock poisoned");
        let idx = graph.add_node(record);
        self.node_index.insert(id, idx);
        Ok(id)
    }

    /// Create a relationship between two existing nodes.
    pub fn create_relationship(
        &self,
        from: NodeId,
        to: NodeId,
        predicate: impl Into<String>,
        properties: impl IntoIterator<Item = (String, PropValue)>,
    ) -> GraphResult<RelId> {
        let from_idx = self.node_idx(from)?;
        let to_idx = self.node_idx(to)?;
        let id = RelId(self.rel_ids.next_raw()?);
        let record = RelRecord {
            id,
            predicate: predicate.into(),
            properties: properties.into_iter().collect(),
        };
        let mut graph = self.graph.write().expect("graph lock poisoned");
        let idx = graph.add_edge(from_idx, to_idx, record);
        self.rel_index.insert(id, idx);
        Ok(id)
    }

    /// Read a node property.
    pub fn node_property(&self, node: NodeId, key: &str) -> GraphResult<Option<PropValue>> {
        let idx = self.node_idx(node)?;
        let graph = self.graph.read().expect("graph lock poisoned");
        Ok(graph
            .node_weight(idx)
            .and_then(|record| record.properties.get(key))
            .cloned())
    }

    /// Set a node property, replacing any previous value.
    pub fn set_node_property(
        &self,
        node: NodeId,
        key: impl Into<String>,
        value: impl Into<PropValue>,
    ) -> GraphResult<()> {
        let idx = self.node_idx(node)?;
        let mut graph = self.graph.write().expect("graph lock poisoned");
        let record = graph
            .node_weight_mut(idx)
            .ok_or(GraphError::NodeNotFound { node_id: node.get() })?;
        record.properties.insert(key.into(), value.into());
        Ok(())
    }

    /// Read a relationship property.
    pub fn rel_property(&self, rel: RelId, key: &str) -> GraphResult<Option<PropValue>> {
        let idx = self.rel_idx(rel)?;
        let graph = self.graph.read().expect("graph lock poisoned");
        Ok(graph
            .edge_weight(idx)
            .and_then(|record| record.properties.get(key))
            .cloned())
    }

    /// Set a relationship property, replacing any previous value.
    pub fn set_rel_property(
        &self,
        rel: RelId,
        key: impl Into<String>,
        value: impl Into<PropValue>,
    ) -> GraphResult<()> {
        let idx = self.rel_idx(rel)?;
        let mut graph = self.graph.write().expect("graph lock poisoned");
        let record = graph
            .edge_weight_mut(idx)
            .ok_or(GraphError::RelationshipNotFound { rel_id: rel.get() })?;
        record.properties.insert(key.into(), value.into());
        Ok(())
    }

    /// Get a relationship's predicate (its type).
    pub fn rel_predicate(&self, rel: RelId) -> GraphResult<String> {
        let idx = self.rel_idx(rel)?;
        let graph = self.graph.read().expect("graph lock poisoned");
        graph
            .edge_weight(idx)
            .map(|record| record.predicate.clone())
            .ok_or(GraphError::RelationshipNotFound { rel_id: rel.get() })
    }

    /// Get a relationship's (source, target) node ids.
    pub fn rel_endpoints(&self, rel: RelId) -> GraphResult<(NodeId, NodeId)> {
        let idx = self.rel_idx(rel)?;
        let graph = self.graph.read().expect("graph lock poisoned");
        let (a, b) = graph
            .edge_endpoints(idx)
            .ok_or(GraphError::RelationshipNotFound { rel_id: rel.get() })?;
        let from = Self::id_of(&graph, a)?;
        let to = Self::id_of(&graph, b)?;
        Ok((from, to))
    }

    /// Add a label to a node. Duplicate labels are kept once.
    pub fn add_label(&self, node: NodeId, label: impl Into<String>) -> GraphResult<()> {
        let idx = self.node_idx(node)?;
        let label = label.into();
        let mut graph = self.graph.write().expect("graph lock poisoned");
        let record = graph
            .node_weight_mut(idx)
            .ok_or(GraphError::NodeNotFound { node_id: node.get() })?;
        if !record.labels.contains(&label) {
            record.labels.push(label);
        }
        Ok(())
    }

    /// Get all labels of a node.
    pub fn labels(&self, node: NodeId) -> GraphResult<Vec<String>> {
        let idx = self.node_idx(node)?;
        let graph = self.graph.read().expect("graph lock poisoned");
        graph
            .node_weight(idx)
            .map(|record| record.labels.clone())
            .ok_or(GraphError::NodeNotFound { node_id: node.get() })
    }

    /// All outgoing relationships of a node.
    pub fn outgoing(&self, node: NodeId) -> GraphResult<Vec<RelRef>> {
        let idx = self.node_idx(node)?;
        let graph = self.graph.read().expect("graph lock poisoned");
        let mut rels = Vec::new();
        for edge in graph.edges_directed(idx, Direction::Outgoing) {
            rels.push(RelRef {
                rel_id: edge.weight().id,
                predicate: edge.weight().predicate.clone(),
                target: Self::id_of(&graph, edge.target())?,
            });
        }
        Ok(rels)
    }

    /// Whether a node with this id exists.
    pub fn has_node(&self, node: NodeId) -> bool {
        self.node_index.contains_key(&node)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    /// Number of relationships.
    pub fn rel_count(&self) -> usize {
        self.rel_index.len()
    }

    fn node_idx(&self, node: NodeId) -> GraphResult<NodeIndex> {
        self.node_index
            .get(&node)
            .map(|idx| *idx.value())
            .ok_or(GraphError::NodeNotFound { node_id: node.get() })
    }

    fn rel_idx(&self, rel: RelId) -> GraphResult<EdgeIndex> {
        self.rel_index
            .get(&rel)
            .map(|idx| *idx.value())
            .ok_or(GraphError::RelationshipNotFound { rel_id: rel.get() })
    }

    fn id_of(graph: &DiGraph<NodeRecord, RelRecord>, idx: NodeIndex) -> GraphResult<NodeId> {
        graph
            .node_weight(idx)
            .map(|record| record.id)
            .ok_or(GraphError::NodeNotFound { node_id: 0 })
    }
}

impl Default for PropertyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PropertyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyGraph")
            .field("nodes", &self.node_count())
            .field("relationships", &self.rel_count())
            .finish()
    }
}
