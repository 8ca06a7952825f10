//! Statement import pipeline.
//!
//! One [`Importer`] processes one batch at a time with a single logical
//! writer: classify subject and object, resolve or allocate their nodes
//! through the index manager, fingerprint the statement, skip duplicates,
//! and write the relationship with its validity interval. At the batch
//! boundary [`Importer::finish_batch`] pumps the in-memory index tiers into
//! the persistent tiers and drops all batch-local state.
//!
//! There is no mid-batch rollback: a batch failing after a partial flush
//! leaves the persistent tier with whatever was flushed. Callers needing
//! atomicity must snapshot the index directory before the batch.

use crate::config::StoreConfig;
use crate::error::IngestError;
use crate::graph::{NodeId, PropValue, PropertyGraph, RelId, props};
use crate::hash::{resource_hash, statement_hash};
use crate::identity::{NodeKind, identifier_of};
use crate::index::BatchIndexManager;
use crate::statement::Statement;
use crate::versioning::{VersionRange, apply_version};

/// Result type for ingestion operations.
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Per-statement outcome. Hard failures (incomplete statements, identity or
/// index errors) are returned as errors instead; they abort only the
/// statement, never the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementOutcome {
    /// The statement was new; its relationship was written.
    Inserted {
        /// The written relationship.
        rel: RelId,
    },
    /// The statement's fingerprint was already known; nothing was written.
    Duplicate {
        /// The fingerprint that collided.
        hash: u64,
    },
    /// The statement could not be attributed to a resource and the store is
    /// configured to reject such statements.
    RejectedUnattributable,
}

/// Counters accumulated over one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Relationships written.
    pub inserted: usize,
    /// Statements skipped as duplicates.
    pub duplicates: usize,
    /// Statements rejected by the attribution policy.
    pub rejected: usize,
}

/// Single-writer import pipeline over a property graph.
pub struct Importer<'g> {
    graph: &'g PropertyGraph,
    indices: BatchIndexManager,
    config: StoreConfig,
    version: VersionRange,
    summary: BatchSummary,
}

impl<'g> Importer<'g> {
    /// Open an importer over the given graph. The version range is stamped
    /// onto every relationship written in this batch.
    pub fn open(
        graph: &'g PropertyGraph,
        config: StoreConfig,
        version: VersionRange,
    ) -> IngestResult<Self> {
        let indices = BatchIndexManager::open(&config)?;
        Ok(Self {
            graph,
            indices,
            config,
            version,
            summary: BatchSummary::default(),
        })
    }

    /// Set the version range for subsequently written relationships. Used
    /// when one importer processes several batches back to back.
    pub fn set_version_range(&mut self, version: VersionRange) {
        self.version = version;
    }

    /// Access the index manager, e.g. to pre-resolve identities.
    pub fn index_manager(&mut self) -> &mut BatchIndexManager {
        &mut self.indices
    }

    /// Process one statement.
    pub fn handle_statement(&mut self, stmt: &Statement) -> IngestResult<StatementOutcome> {
        let subject_kind = stmt
            .subject_kind
            .ok_or_else(|| IngestError::IncompleteStatement {
                uuid: stmt.uuid.clone(),
            })?;
        let object_kind = stmt
            .object_kind
            .ok_or_else(|| IngestError::IncompleteStatement {
                uuid: stmt.uuid.clone(),
            })?;
        let predicate = stmt
            .predicate
            .as_deref()
            .ok_or_else(|| IngestError::IncompleteStatement {
                uuid: stmt.uuid.clone(),
            })?;
        if subject_kind == NodeKind::Literal {
            return Err(IngestError::IncompleteStatement {
                uuid: stmt.uuid.clone(),
            });
        }

        // The statement's data-model URI doubles as the hash salt; the
        // configured store data model is the fallback.
        let salt = stmt
            .subject_data_model
            .clone()
            .unwrap_or_else(|| self.config.data_model_uri.clone());

        let subject_node = self.resolve_or_create_subject(stmt, subject_kind, &salt)?;
        let subject_ident = identifier_of(self.graph, subject_node, subject_kind);

        // Blank-node objects are identified by their node id, so they must be
        // resolved before hashing; resources and literals hash from the
        // statement itself, avoiding node creation for duplicates.
        let object_pre_resolved = if object_kind.is_bnode() {
            Some(self.resolve_or_create_object(stmt, object_kind, &salt)?)
        } else {
            None
        };
        let object_ident = match object_pre_resolved {
            Some(node) => identifier_of(self.graph, node, object_kind),
            None => stmt.object_identity(),
        };

        let hash = statement_hash(
            predicate,
            Some(subject_kind),
            Some(object_kind),
            subject_ident.as_deref(),
            object_ident.as_deref(),
            &salt,
        )?;

        if self.indices.statement_seen(hash)? {
            tracing::debug!(uuid = %stmt.uuid, hash, "skipping duplicate statement");
            self.summary.duplicates += 1;
            return Ok(StatementOutcome::Duplicate { hash });
        }

        // Attribute the statement to its owning resource.
        let subject_hash = if subject_kind.is_resource() {
            stmt.subject_uri
                .as_deref()
                .map(|uri| resource_hash(uri, &salt))
        } else {
            None
        };
        let attributed = self.indices.determine_resource_hash(
            subject_node,
            Some(subject_kind),
            subject_hash,
            stmt.resource_hash,
        );
        if attributed.is_none() {
            tracing::warn!(uuid = %stmt.uuid, "statement has no resource attribution");
            if self.config.reject_unattributable {
                self.summary.rejected += 1;
                return Ok(StatementOutcome::RejectedUnattributable);
            }
        }

        let object_node = match object_pre_resolved {
            Some(node) => node,
            None => self.resolve_or_create_object(stmt, object_kind, &salt)?,
        };

        let mut rel_props = vec![(
            props::STATEMENT_UUID.to_owned(),
            PropValue::from(stmt.uuid.clone()),
        )];
        rel_props.push((props::DATA_MODEL.to_owned(), PropValue::from(salt.clone())));
        if let Some(hash) = attributed {
            rel_props.push((props::RESOURCE_HASH.to_owned(), PropValue::from(hash)));
        }
        if let Some(order) = stmt.qualified.order {
            rel_props.push((props::ORDER.to_owned(), PropValue::from(order)));
        }
        if let Some(index) = stmt.qualified.index {
            rel_props.push((props::INDEX.to_owned(), PropValue::from(index)));
        }
        if let Some(evidence) = &stmt.qualified.evidence {
            rel_props.push((props::EVIDENCE.to_owned(), PropValue::from(evidence.clone())));
        }
        if let Some(confidence) = stmt.qualified.confidence {
            rel_props.push((props::CONFIDENCE.to_owned(), PropValue::from(confidence)));
        }

        let rel = self
            .graph
            .create_relationship(subject_node, object_node, predicate, rel_props)?;
        apply_version(self.graph, rel, self.version)?;

        // Type statements label the subject with the type's URI.
        if object_kind == NodeKind::TypeResource {
            if let Some(uri) = stmt.object_uri.as_deref() {
                self.graph.add_label(subject_node, uri)?;
            }
        }

        self.indices.record_statement(hash);
        self.summary.inserted += 1;
        Ok(StatementOutcome::Inserted { rel })
    }

    /// Flush the index tiers and clear all batch-local state, returning the
    /// batch counters.
    pub fn finish_batch(&mut self) -> IngestResult<BatchSummary> {
        self.indices.pump_and_flush()?;
        self.indices.clear_batch_state();

        let summary = self.summary;
        tracing::info!(
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            rejected = summary.rejected,
            "finished import batch"
        );
        self.summary = BatchSummary::default();
        Ok(summary)
    }

    // -- node resolution ----------------------------------------------------

    fn resolve_or_create_subject(
        &mut self,
        stmt: &Statement,
        kind: NodeKind,
        data_model: &str,
    ) -> IngestResult<NodeId> {
        match kind {
            NodeKind::Resource | NodeKind::TypeResource => {
                let uri = stmt.subject_uri.as_deref().ok_or_else(|| {
                    IngestError::IncompleteStatement {
                        uuid: stmt.uuid.clone(),
                    }
                })?;
                self.resolve_or_create_resource(uri, kind, data_model)
            }
            NodeKind::BNode | NodeKind::TypeBNode => {
                let local_id = stmt.subject_id.as_deref().ok_or_else(|| {
                    IngestError::IncompleteStatement {
                        uuid: stmt.uuid.clone(),
                    }
                })?;
                self.resolve_or_create_bnode(local_id, kind)
            }
            NodeKind::Literal => Err(IngestError::IncompleteStatement {
                uuid: stmt.uuid.clone(),
            }),
        }
    }

    fn resolve_or_create_object(
        &mut self,
        stmt: &Statement,
        kind: NodeKind,
        data_model: &str,
    ) -> IngestResult<NodeId> {
        match kind {
            NodeKind::Resource | NodeKind::TypeResource => {
                let uri = stmt.object_uri.as_deref().ok_or_else(|| {
                    IngestError::IncompleteStatement {
                        uuid: stmt.uuid.clone(),
                    }
                })?;
                let object_dm = stmt.object_data_model.as_deref().unwrap_or(data_model);
                self.resolve_or_create_resource(uri, kind, object_dm)
            }
            NodeKind::BNode | NodeKind::TypeBNode => {
                let local_id = stmt.object_id.as_deref().ok_or_else(|| {
                    IngestError::IncompleteStatement {
                        uuid: stmt.uuid.clone(),
                    }
                })?;
                self.resolve_or_create_bnode(local_id, kind)
            }
            // Literal occurrences are never reused by identity; each one may
            // be a fresh node.
            NodeKind::Literal => {
                let value = stmt.object_value.as_deref().ok_or_else(|| {
                    IngestError::IncompleteStatement {
                        uuid: stmt.uuid.clone(),
                    }
                })?;
                let node = self.graph.create_node([
                    (
                        props::NODE_KIND.to_owned(),
                        PropValue::from(NodeKind::Literal.as_tag()),
                    ),
                    (props::VALUE.to_owned(), PropValue::from(value)),
                ])?;
                Ok(node)
            }
        }
    }

    fn resolve_or_create_resource(
        &mut self,
        uri: &str,
        kind: NodeKind,
        data_model: &str,
    ) -> IngestResult<NodeId> {
        let existing = match kind {
            NodeKind::TypeResource => self.indices.get_resource_type(uri)?,
            _ => {
                self.indices
                    .get_scoped_resource(&format!("{uri}{data_model}"))?
            }
        };
        if let Some(node) = existing {
            return Ok(node);
        }

        let node = self.graph.create_node([
            (
                props::NODE_KIND.to_owned(),
                PropValue::from(kind.as_tag()),
            ),
            (props::URI.to_owned(), PropValue::from(uri)),
        ])?;

        match kind {
            NodeKind::TypeResource => {
                self.indices.put_resource_type(uri, node);
            }
            _ => {
                self.graph
                    .set_node_property(node, props::DATA_MODEL, data_model)?;
                self.indices.put_resource(uri, node);
                self.indices
                    .put_scoped_resource(format!("{uri}{data_model}"), node);
            }
        }
        Ok(node)
    }

    fn resolve_or_create_bnode(&mut self, local_id: &str, kind: NodeKind) -> IngestResult<NodeId> {
        if let Some(node) = self.indices.get_bnode(local_id) {
            return Ok(node);
        }
        let node = self.graph.create_node([(
            props::NODE_KIND.to_owned(),
            PropValue::from(kind.as_tag()),
        )])?;
        self.indices.put_bnode(local_id, node);
        Ok(node)
    }
}

impl std::fmt::Debug for Importer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("version", &self.version)
            .field("summary", &self.summary)
            .finish()
    }
}
