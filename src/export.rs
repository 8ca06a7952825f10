//! Read-side adapter: stored nodes back to serializable values.
//!
//! A [`SubgraphReader`] walks stored nodes and produces [`ExportNode`]
//! values suitable for JSON serialization. Within one export pass the reader
//! deduplicates repeated encounters through identity caches — resources by
//! `uri` or `uri‖dataModel`, blank nodes by node id — so the same logical
//! entity is materialized exactly once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::graph::{NodeId, PropertyGraph, RelId, props};
use crate::identity::{NodeKind, classify};

/// Result type for export operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Serializable view of a stored node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportNode {
    /// Resource with URI and optional data-model scope.
    Resource {
        /// Internal node id.
        node_id: u64,
        /// Resource URI.
        uri: String,
        /// Data-model (provenance) URI, when scoped.
        data_model: Option<String>,
    },
    /// Blank-node placeholder; carries only the internal id.
    BNode {
        /// Internal node id.
        node_id: u64,
    },
    /// Literal value.
    Literal {
        /// Internal node id.
        node_id: u64,
        /// The scalar value.
        value: String,
    },
}

/// Serializable view of a stored statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportStatement {
    /// Subject view.
    pub subject: ExportNode,
    /// Predicate URI.
    pub predicate: String,
    /// Object view.
    pub object: ExportNode,
    /// Statement UUID, when the relationship carries one.
    pub uuid: Option<String>,
}

/// One export pass over a property graph.
///
/// The identity caches live for the lifetime of the reader; start a fresh
/// reader per export pass.
#[derive(Debug)]
pub struct SubgraphReader<'g> {
    graph: &'g PropertyGraph,
    bnodes: HashMap<NodeId, ExportNode>,
    resources: HashMap<String, ExportNode>,
}

impl<'g> SubgraphReader<'g> {
    /// Create a reader over the given graph.
    pub fn new(graph: &'g PropertyGraph) -> Self {
        Self {
            graph,
            bnodes: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    /// Read a node in subject position. Literals cannot be subjects.
    pub fn read_subject(&mut self, node: NodeId) -> ExportResult<ExportNode> {
        let kind = classify(self.graph, node)?;
        match kind {
            NodeKind::Resource | NodeKind::TypeResource => self.read_resource(node),
            NodeKind::BNode | NodeKind::TypeBNode => Ok(self.bnode_placeholder(node)),
            NodeKind::Literal => Err(ExportError::InvalidSubjectKind {
                node_id: node.get(),
                kind: kind.to_string(),
            }),
        }
    }

    /// Read a node in object position.
    pub fn read_object(&mut self, node: NodeId) -> ExportResult<ExportNode> {
        let kind = classify(self.graph, node)?;
        match kind {
            NodeKind::Resource | NodeKind::TypeResource => self.read_resource(node),
            NodeKind::BNode | NodeKind::TypeBNode => Ok(self.bnode_placeholder(node)),
            NodeKind::Literal => {
                let value = self
                    .graph
                    .node_property(node, props::VALUE)?
                    .and_then(|v| v.as_str().map(str::to_owned))
                    .ok_or(ExportError::MissingProperty {
                        node_id: node.get(),
                        property: props::VALUE,
                    })?;
                Ok(ExportNode::Literal {
                    node_id: node.get(),
                    value,
                })
            }
        }
    }

    /// Read a whole statement from a stored relationship.
    pub fn read_statement(&mut self, rel: RelId) -> ExportResult<ExportStatement> {
        let (subject_id, object_id) = self.graph.rel_endpoints(rel)?;
        let subject = self.read_subject(subject_id)?;
        let object = self.read_object(object_id)?;
        let predicate = self.graph.rel_predicate(rel)?;
        let uuid = self
            .graph
            .rel_property(rel, props::STATEMENT_UUID)?
            .and_then(|v| v.as_str().map(str::to_owned));
        Ok(ExportStatement {
            subject,
            predicate,
            object,
            uuid,
        })
    }

    fn read_resource(&mut self, node: NodeId) -> ExportResult<ExportNode> {
        let uri = self
            .graph
            .node_property(node, props::URI)?
            .and_then(|v| v.as_str().map(str::to_owned))
            .ok_or(ExportError::MissingProperty {
                node_id: node.get(),
                property: props::URI,
            })?;
        let data_model = self
            .graph
            .node_property(node, props::DATA_MODEL)?
            .and_then(|v| v.as_str().map(str::to_owned));

        let cache_key = match &data_model {
            Some(dm) => format!("{uri}{dm}"),
            None => uri.clone(),
        };
        if let Some(cached) = self.resources.get(&cache_key) {
            return Ok(cached.clone());
        }

        let exported = ExportNode::Resource {
            node_id: node.get(),
            uri,
            data_model,
        };
        self.resources.insert(cache_key, exported.clone());
        Ok(exported)
    }

    fn bnode_placeholder(&mut self, node: NodeId) -> ExportNode {
        self.bnodes
            .entry(node)
            .or_insert_with(|| ExportNode::BNode {
                node_id: node.get(),
            })
            .clone()
    }
}
