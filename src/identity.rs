//! Node identity model: kind classification and canonical identifiers.
//!
//! Every persisted node is one of five kinds. The kind is stored as a tag
//! property and classification is strict: a missing or unrecognized tag is an
//! error, never a default, because the kind feeds directly into statement
//! hashing and a mis-kinded node would silently change fingerprints.

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
use crate::graph::{NodeId, PropertyGraph, props};

/// Result type for identity operations.
pub type IdentityResult<T> = std::result::Result<T, IdentityError>;

/// Classification of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Externally addressable entity, identified by URI.
    Resource,
    /// Resource appearing in type position (the object of a type statement).
    TypeResource,
    /// Blank node: no URI, identity scoped to one import batch.
    BNode,
    /// Blank node appearing in type position.
    TypeBNode,
    /// Terminal scalar value.
    Literal,
}

impl NodeKind {
    /// The tag string stored in the node's kind property.
    pub fn as_tag(self) -> &'static str {
        match self {
            NodeKind::Resource => "resource",
            NodeKind::TypeResource => "type_resource",
            NodeKind::BNode => "bnode",
            NodeKind::TypeBNode => "type_bnode",
            NodeKind::Literal => "literal",
        }
    }

    /// Parse a stored tag string. Returns `None` for unrecognized tags; the
    /// caller turns that into [`IdentityError::UnknownKindTag`] with node
    /// context attached.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "resource" => Some(NodeKind::Resource),
            "type_resource" => Some(NodeKind::TypeResource),
            "bnode" => Some(NodeKind::BNode),
            "type_bnode" => Some(NodeKind::TypeBNode),
            "literal" => Some(NodeKind::Literal),
            _ => None,
        }
    }

    /// Whether this kind is addressed by URI.
    pub fn is_resource(self) -> bool {
        matches!(self, NodeKind::Resource | NodeKind::TypeResource)
    }

    /// Whether this kind is a blank node.
    pub fn is_bnode(self) -> bool {
        matches!(self, NodeKind::BNode | NodeKind::TypeBNode)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Determine the kind of a stored node from its kind tag property.
///
/// Fails with [`IdentityError::MissingKindTag`] when the property is absent
/// and [`IdentityError::UnknownKindTag`] when it is unrecognized. Both abort
/// the enclosing operation for this node.
pub fn classify(graph: &PropertyGraph, node: NodeId) -> IdentityResult<NodeKind> {
    let tag = graph
        .node_property(node, props::NODE_KIND)
        .ok()
        .flatten()
        .and_then(|value| value.as_str().map(str::to_owned))
        .ok_or(IdentityError::MissingKindTag { node_id: node.get() })?;

    NodeKind::from_tag(&tag).ok_or(IdentityError::UnknownKindTag {
        node_id: node.get(),
        tag,
    })
}

/// Derive the canonical identifier string of a node under a given kind.
///
/// - Resources: URI, or `URI‖dataModelURI` when the node is data-model
///   scoped. The concatenation order matches resource-hash construction.
/// - Blank nodes: the decimal string of the internal node id.
/// - Literals: the literal value.
///
/// Returns `None` when the identifying property is absent.
pub fn identifier_of(
    graph: &PropertyGraph,
    node: NodeId,
    kind: NodeKind,
) -> Option<String> {
    match kind {
        NodeKind::Resource | NodeKind::TypeResource => {
            let uri = graph
                .node_property(node, props::URI)
                .ok()
                .flatten()
                .and_then(|value| value.as_str().map(str::to_owned))?;
            let data_model = graph
                .node_property(node, props::DATA_MODEL)
                .ok()
                .flatten()
                .and_then(|value| value.as_str().map(str::to_owned));
            match data_model {
                Some(dm) => Some(format!("{uri}{dm}")),
                None => Some(uri),
            }
        }
        NodeKind::BNode | NodeKind::TypeBNode => Some(node.get().to_string()),
        NodeKind::Literal => graph
            .node_property(node, props::VALUE)
            .ok()
            .flatten()
            .and_then(|value| value.as_str().map(str::to_owned)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropValue;

    fn graph_with_node(props: Vec<(&str, &str)>) -> (PropertyGraph, NodeId) {
        let graph = PropertyGraph::new();
        let node = graph
            .create_node(
                props
                    .into_iter()
                    .map(|(k, v)| (k.to_owned(), PropValue::from(v))),
            )
            .unwrap();
        (graph, node)
    }

    #[test]
    fn classify_all_tags() {
        for kind in [
            NodeKind::Resource,
            NodeKind::TypeResource,
            NodeKind::BNode,
            NodeKind::TypeBNode,
            NodeKind::Literal,
        ] {
            let (graph, node) = graph_with_node(vec![(props::NODE_KIND, kind.as_tag())]);
            assert_eq!(classify(&graph, node).unwrap(), kind);
        }
    }

    #[test]
    fn classify_missing_tag_fails() {
        let (graph, node) = graph_with_node(vec![]);
        assert!(matches!(
            classify(&graph, node),
            Err(IdentityError::MissingKindTag { .. })
        ));
    }

    #[test]
    fn classify_unknown_tag_fails() {
        let (graph, node) = graph_with_node(vec![(props::NODE_KIND, "quad")]);
        let err = classify(&graph, node).unwrap_err();
        match err {
            IdentityError::UnknownKindTag { tag, .. } => assert_eq!(tag, "quad"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn resource_identifier_without_data_model() {
        let (graph, node) = graph_with_node(vec![(props::URI, "http://example.org/a")]);
        assert_eq!(
            identifier_of(&graph, node, NodeKind::Resource).as_deref(),
            Some("http://example.org/a")
        );
    }

    #[test]
    fn resource_identifier_concatenates_data_model() {
        let (graph, node) = graph_with_node(vec![
            (props::URI, "http://example.org/a"),
            (props::DATA_MODEL, "http://example.org/dm/1"),
        ]);
        assert_eq!(
            identifier_of(&graph, node, NodeKind::Resource).as_deref(),
            Some("http://example.org/ahttp://example.org/dm/1")
        );
    }

    #[test]
    fn bnode_identifier_is_decimal_node_id() {
        let (graph, node) = graph_with_node(vec![]);
        assert_eq!(
            identifier_of(&graph, node, NodeKind::BNode).as_deref(),
            Some(node.get().to_string().as_str())
        );
    }

    #[test]
    fn literal_identifier_is_value() {
        let (graph, node) = graph_with_node(vec![(props::VALUE, "42")]);
        assert_eq!(
            identifier_of(&graph, node, NodeKind::Literal).as_deref(),
            Some("42")
        );
    }

    #[test]
    fn literal_without_value_has_no_identifier() {
        let (graph, node) = graph_with_node(vec![]);
        assert_eq!(identifier_of(&graph, node, NodeKind::Literal), None);
    }

    #[test]
    fn tag_roundtrip() {
        for kind in [
            NodeKind::Resource,
            NodeKind::TypeResource,
            NodeKind::BNode,
            NodeKind::TypeBNode,
            NodeKind::Literal,
        ] {
            assert_eq!(NodeKind::from_tag(kind.as_tag()), Some(kind));
        }
        assert_eq!(NodeKind::from_tag("entity"), None);
    }
}
