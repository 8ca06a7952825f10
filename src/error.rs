//! Diagnostic error types for the terngraph store.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains. Per-statement failures
//! (identity, attribution) are distinguished from batch-fatal failures (index
//! storage) so callers can decide what to abort.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the terngraph store.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum TernError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Delta(#[from] DeltaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Identity errors
// ---------------------------------------------------------------------------

/// Errors raised while classifying nodes or deriving canonical identifiers.
///
/// All of these are fatal to the single node or statement being processed; a
/// node without a determinable kind corrupts downstream hashing and must never
/// be silently defaulted.
#[derive(Debug, Error, Diagnostic)]
pub enum IdentityError {
    #[error("node {node_id} carries no kind tag")]
    #[diagnostic(
        code(tern::identity::missing_kind_tag),
        help(
            "Every persisted node must carry the kind tag property. A node \
             without one indicates a corrupted or foreign store; re-ingest \
             the data rather than guessing a kind."
        )
    )]
    MissingKindTag { node_id: u64 },

    #[error("node {node_id} carries unknown kind tag '{tag}'")]
    #[diagnostic(
        code(tern::identity::unknown_kind_tag),
        help(
            "Valid kind tags are: resource, type_resource, bnode, type_bnode, \
             literal. An unrecognized tag usually means the store was written \
             by a newer version of terngraph."
        )
    )]
    UnknownKindTag { node_id: u64, tag: String },

    #[error("cannot hash statement: subject/object kind or identifier is missing")]
    #[diagnostic(
        code(tern::identity::incomplete),
        help(
            "Statement hashing requires the subject kind, subject identifier, \
             object kind, and object identifier. Resolve identities before \
             requesting a hash; this is a caller error, not a data error."
        )
    )]
    IncompleteIdentity,
}

// ---------------------------------------------------------------------------
// Graph (substrate) errors
// ---------------------------------------------------------------------------

/// Errors from the embedded property-graph substrate.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node not found: {node_id}")]
    #[diagnostic(
        code(tern::graph::node_not_found),
        help("The node id does not exist in this store. Node ids are not portable across stores.")
    )]
    NodeNotFound { node_id: u64 },

    #[error("relationship not found: {rel_id}")]
    #[diagnostic(
        code(tern::graph::relationship_not_found),
        help("The relationship id does not exist in this store.")
    )]
    RelationshipNotFound { rel_id: u64 },

    #[error("id allocator exhausted: cannot allocate more than u64::MAX ids")]
    #[diagnostic(
        code(tern::graph::allocator_exhausted),
        help(
            "The id space is exhausted. This requires 2^64 allocations and \
             should never happen in practice; check for an allocation loop."
        )
    )]
    AllocatorExhausted,
}

// ---------------------------------------------------------------------------
// Index errors
// ---------------------------------------------------------------------------

/// Errors from the persistent index tier. All of these are fatal to the
/// enclosing import batch.
#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    #[error("couldn't open index storage at {path}: {message}")]
    #[diagnostic(
        code(tern::index::open),
        help(
            "The persistent index database could not be opened or created. \
             Check that the index directory exists, has correct permissions, \
             and is not opened by another process."
        )
    )]
    Open { path: String, message: String },

    #[error("couldn't read '{index}' index: {message}")]
    #[diagnostic(
        code(tern::index::read),
        help(
            "A lookup against the persistent tier failed. This may indicate \
             index corruption; rebuild the indices from the primary store."
        )
    )]
    Read { index: &'static str, message: String },

    #[error("couldn't flush '{index}' index: {message}")]
    #[diagnostic(
        code(tern::index::flush),
        help(
            "Writing the in-memory tier into the persistent tier failed. The \
             persistent tier may hold a partial batch; restore from a backup \
             taken before the batch, then re-run the import."
        )
    )]
    Flush { index: &'static str, message: String },
}

// ---------------------------------------------------------------------------
// Ingest errors
// ---------------------------------------------------------------------------

/// Errors raised by the statement import pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("statement {uuid} is missing its subject or object description")]
    #[diagnostic(
        code(tern::ingest::incomplete_statement),
        help(
            "A statement needs at least a subject kind, predicate URI, and \
             object kind. Check the upstream parser output."
        )
    )]
    IncompleteStatement { uuid: String },

    #[error("statement {uuid} cannot be attributed to any resource")]
    #[diagnostic(
        code(tern::ingest::unattributable),
        help(
            "Neither the subject nor an inherited resource hash identifies \
             the owning resource. Pass the containing resource hash through \
             the statement builder, or configure the store to accept \
             unattributed statements."
        )
    )]
    UnattributableStatement { uuid: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors raised by the read-side adapter.
#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("node {node_id} has kind {kind} which cannot appear as a subject")]
    #[diagnostic(
        code(tern::export::bad_subject),
        help("Subjects can only be resources or blank nodes, never literals.")
    )]
    InvalidSubjectKind { node_id: u64, kind: String },

    #[error("node {node_id} is missing its '{property}' property")]
    #[diagnostic(
        code(tern::export::missing_property),
        help(
            "A node of this kind must carry this property. Its absence \
             indicates a write that bypassed the import pipeline."
        )
    )]
    MissingProperty { node_id: u64, property: &'static str },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Delta errors
// ---------------------------------------------------------------------------

/// Errors raised by the subgraph delta engine.
#[derive(Debug, Error, Diagnostic)]
pub enum DeltaError {
    #[error("leaf set of composite entity {cs_entity_id} could not be resolved")]
    #[diagnostic(
        code(tern::delta::unresolved_entity),
        help(
            "No path from the composite entity to its leaves exists in this \
             snapshot. The entity's comparison is skipped and reported as \
             unresolved; it is never reported as unchanged."
        )
    )]
    UnresolvedEntity { cs_entity_id: u64 },

    #[error("no path from entity {root_id} to leaf {leaf_id}")]
    #[diagnostic(
        code(tern::delta::no_path),
        help(
            "Path marking walks from the composite entity root to each leaf. \
             A missing path means the leaf does not belong to this entity's \
             subgraph."
        )
    )]
    NoPath { root_id: u64, leaf_id: u64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors raised while validating store configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(tern::config::invalid),
        help("Check the StoreConfig fields. {message}")
    )]
    Invalid { message: String },

    #[error("index directory error: {path}")]
    #[diagnostic(
        code(tern::config::index_dir),
        help(
            "The index directory could not be created or accessed. Ensure \
             the path exists and has read/write permissions."
        )
    )]
    IndexDir { path: String },
}

/// Convenience alias for functions returning terngraph results.
pub type TernResult<T> = std::result::Result<T, TernError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_error_converts_to_tern_error() {
        let err = IdentityError::MissingKindTag { node_id: 7 };
        let tern: TernError = err.into();
        assert!(matches!(
            tern,
            TernError::Identity(IdentityError::MissingKindTag { .. })
        ));
    }

    #[test]
    fn index_error_converts_through_ingest() {
        let err = IndexError::Read {
            index: "resources",
            message: "boom".into(),
        };
        let ingest: IngestError = err.into();
        assert!(matches!(ingest, IngestError::Index(IndexError::Read { .. })));
    }

    #[test]
    fn error_messages_carry_context() {
        let err = IndexError::Flush {
            index: "statement_hashes",
            message: "disk full".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("statement_hashes"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn unknown_kind_tag_names_the_tag() {
        let err = IdentityError::UnknownKindTag {
            node_id: 3,
            tag: "gizmo".into(),
        };
        assert!(format!("{err}").contains("gizmo"));
    }
}
