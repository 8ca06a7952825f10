//! Statement model: one triple plus its qualifiers and provenance.
//!
//! A [`Statement`] is the unit of ingestion. Every field except the predicate
//! is optional at the type level because statements arrive from streaming
//! parsers that discover their shape incrementally; the import pipeline
//! validates the minimum shape (subject kind, predicate, object kind) when a
//! statement is handled.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::NodeKind;

/// Optional per-statement qualifiers, copied independently onto the written
/// relationship when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualifiedAttributes {
    /// Ordinal of the statement among its siblings.
    pub order: Option<i64>,
    /// Positional index within the source record.
    pub index: Option<i64>,
    /// Evidence marker.
    pub evidence: Option<String>,
    /// Confidence score.
    pub confidence: Option<i64>,
}

impl QualifiedAttributes {
    /// Whether no qualifier is set.
    pub fn is_empty(&self) -> bool {
        self.order.is_none()
            && self.index.is_none()
            && self.evidence.is_none()
            && self.confidence.is_none()
    }
}

/// An immutable triple-shaped statement with provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Kind of the subject node.
    pub subject_kind: Option<NodeKind>,
    /// Subject URI (resource subjects).
    pub subject_uri: Option<String>,
    /// Batch-local subject identifier (blank-node subjects).
    pub subject_id: Option<String>,
    /// Data-model URI scoping the subject.
    pub subject_data_model: Option<String>,
    /// Predicate URI.
    pub predicate: Option<String>,
    /// Kind of the object node.
    pub object_kind: Option<NodeKind>,
    /// Object URI (resource objects).
    pub object_uri: Option<String>,
    /// Object literal value (literal objects).
    pub object_value: Option<String>,
    /// Batch-local object identifier (blank-node objects).
    pub object_id: Option<String>,
    /// Data-model URI scoping the object.
    pub object_data_model: Option<String>,
    /// Externally stable statement identity, kept across re-imports.
    pub uuid: String,
    /// Precomputed hash of the resource this statement belongs to.
    pub resource_hash: Option<u64>,
    /// Optional qualifiers.
    pub qualified: QualifiedAttributes,
}

impl Statement {
    /// Start building a statement.
    pub fn builder() -> StatementBuilder {
        StatementBuilder::default()
    }

    /// The object's identity string for hashing: URI (optionally data-model
    /// scoped) for resources, the literal value for literals, the local id
    /// for blank nodes.
    pub fn object_identity(&self) -> Option<String> {
        match self.object_kind? {
            NodeKind::Resource | NodeKind::TypeResource => {
                let uri = self.object_uri.as_deref()?;
                match self.object_data_model.as_deref() {
                    Some(dm) => Some(format!("{uri}{dm}")),
                    None => Some(uri.to_owned()),
                }
            }
            NodeKind::Literal => self.object_value.clone(),
            NodeKind::BNode | NodeKind::TypeBNode => self.object_id.clone(),
        }
    }
}

/// Fluent builder for [`Statement`].
///
/// A UUID is generated when none is supplied, so every built statement has a
/// stable external identity.
#[derive(Debug, Clone, Default)]
pub struct StatementBuilder {
    subject_kind: Option<NodeKind>,
    subject_uri: Option<String>,
    subject_id: Option<String>,
    subject_data_model: Option<String>,
    predicate: Option<String>,
    object_kind: Option<NodeKind>,
    object_uri: Option<String>,
    object_value: Option<String>,
    object_id: Option<String>,
    object_data_model: Option<String>,
    uuid: Option<String>,
    resource_hash: Option<u64>,
    qualified: QualifiedAttributes,
}

impl StatementBuilder {
    /// Set the subject kind.
    pub fn subject_kind(mut self, kind: NodeKind) -> Self {
        self.subject_kind = Some(kind);
        self
    }

    /// Set the subject URI.
    pub fn subject_uri(mut self, uri: impl Into<String>) -> Self {
        self.subject_uri = Some(uri.into());
        self
    }

    /// Set the batch-local subject identifier.
    pub fn subject_id(mut self, id: impl Into<String>) -> Self {
        self.subject_id = Some(id.into());
        self
    }

    /// Set the subject's data-model URI.
    pub fn subject_data_model(mut self, uri: impl Into<String>) -> Self {
        self.subject_data_model = Some(uri.into());
        self
    }

    /// Set the predicate URI.
    pub fn predicate(mut self, uri: impl Into<String>) -> Self {
        self.predicate = Some(uri.into());
        self
    }

    /// Set the object kind.
    pub fn object_kind(mut self, kind: NodeKind) -> Self {
        self.object_kind = Some(kind);
        self
    }

    /// Set the object URI.
    pub fn object_uri(mut self, uri: impl Into<String>) -> Self {
        self.object_uri = Some(uri.into());
        self
    }

    /// Set the object literal value.
    pub fn object_value(mut self, value: impl Into<String>) -> Self {
        self.object_value = Some(value.into());
        self
    }

    /// Set the batch-local object identifier.
    pub fn object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    /// Set the object's data-model URI.
    pub fn object_data_model(mut self, uri: impl Into<String>) -> Self {
        self.object_data_model = Some(uri.into());
        self
    }

    /// Set an external statement UUID.
    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Set a precomputed resource hash.
    pub fn resource_hash(mut self, hash: u64) -> Self {
        self.resource_hash = Some(hash);
        self
    }

    /// Set the statement ordinal.
    pub fn order(mut self, order: i64) -> Self {
        self.qualified.order = Some(order);
        self
    }

    /// Set the statement index.
    pub fn index(mut self, index: i64) -> Self {
        self.qualified.index = Some(index);
        self
    }

    /// Set the evidence marker.
    pub fn evidence(mut self, evidence: impl Into<String>) -> Self {
        self.qualified.evidence = Some(evidence.into());
        self
    }

    /// Set the confidence score.
    pub fn confidence(mut self, confidence: i64) -> Self {
        self.qualified.confidence = Some(confidence);
        self
    }

    /// Build the statement, generating a UUID when none was supplied.
    pub fn build(self) -> Statement {
        Statement {
            subject_kind: self.subject_kind,
            subject_uri: self.subject_uri,
            subject_id: self.subject_id,
            subject_data_model: self.subject_data_model,
            predicate: self.predicate,
            object_kind: self.object_kind,
            object_uri: self.object_uri,
            object_value: self.object_value,
            object_id: self.object_id,
            object_data_model: self.object_data_model,
            uuid: self.uuid.unwrap_or_else(|| Uuid::new_v4().to_string()),
            resource_hash: self.resource_hash,
            qualified: self.qualified,
        }
    }
}
