//! Batch index manager: identity resolution and statement deduplication.
//!
//! Owns the four identity indices (`resources`, `resources_with_data_model`,
//! `resource_types`, the batch-local `bnodes`) and the `statement_hashes`
//! dedup index. The string-keyed indices are layered over one redb database;
//! the blank-node index lives purely in memory because blank-node identity
//! does not survive past the current import batch.

use std::collections::HashMap;
use std::sync::Arc;

use redb::{Database, TableDefinition};

use crate::config::StoreConfig;
use crate::graph::NodeId;
use crate::identity::NodeKind;
use crate::index::layered::{IndexResult, LayeredHashIndex, LayeredIndex};

/// Name of the unscoped resource index.
pub const RESOURCES_INDEX: &str = "resources";
/// Name of the data-model-scoped resource index.
pub const RESOURCES_W_DATA_MODEL_INDEX: &str = "resources_with_data_model";
/// Name of the resource-types index.
pub const RESOURCE_TYPES_INDEX: &str = "resource_types";
/// Name of the statement-hash dedup index.
pub const STATEMENT_HASHES_INDEX: &str = "statement_hashes";

const RESOURCES_TABLE: TableDefinition<'static, &str, u64> =
    TableDefinition::new(RESOURCES_INDEX);
const RESOURCES_W_DATA_MODEL_TABLE: TableDefinition<'static, &str, u64> =
    TableDefinition::new(RESOURCES_W_DATA_MODEL_INDEX);
const RESOURCE_TYPES_TABLE: TableDefinition<'static, &str, u64> =
    TableDefinition::new(RESOURCE_TYPES_INDEX);
const STATEMENT_HASHES_TABLE: TableDefinition<'static, u64, ()> =
    TableDefinition::new(STATEMENT_HASHES_INDEX);

/// Resolves identity strings to node ids and deduplicates statements across
/// one import batch.
///
/// A manager instance exclusively owns its persistent index handles; opening
/// the same index directory from two instances concurrently is undefined and
/// must be prevented by the caller.
#[derive(Debug)]
pub struct BatchIndexManager {
    resources: LayeredIndex,
    resources_with_data_model: LayeredIndex,
    resource_types: LayeredIndex,
    statement_hashes: LayeredHashIndex,
    /// Batch-local blank-node identity, never persisted.
    bnodes: HashMap<String, NodeId>,
    /// Per-batch memo of subject node id to attributed resource hash.
    node_resource_map: HashMap<NodeId, u64>,
}

impl BatchIndexManager {
    /// Open the manager, creating the persistent index database when the
    /// configuration names an index directory. Failure to open the database
    /// is fatal and reported as a single [`crate::error::IndexError::Open`].
    pub fn open(config: &StoreConfig) -> IndexResult<Self> {
        let db = match &config.index_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| crate::error::IndexError::Open {
                    path: dir.display().to_string(),
                    message: e.to_string(),
                })?;
                let path = dir.join("indices.redb");
                let db = Database::create(&path).map_err(|e| crate::error::IndexError::Open {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                Some(Arc::new(db))
            }
            None => None,
        };

        tracing::debug!(persistent = db.is_some(), "opening batch index manager");

        Ok(Self {
            resources: LayeredIndex::new(RESOURCES_INDEX, RESOURCES_TABLE, db.clone()),
            resources_with_data_model: LayeredIndex::new(
                RESOURCES_W_DATA_MODEL_INDEX,
                RESOURCES_W_DATA_MODEL_TABLE,
                db.clone(),
            ),
            resource_types: LayeredIndex::new(RESOURCE_TYPES_INDEX, RESOURCE_TYPES_TABLE, db.clone()),
            statement_hashes: LayeredHashIndex::new(
                STATEMENT_HASHES_INDEX,
                STATEMENT_HASHES_TABLE,
                db,
            ),
            bnodes: HashMap::new(),
            node_resource_map: HashMap::new(),
        })
    }

    // -- per-index access ---------------------------------------------------

    /// Register a resource URI in the unscoped resource index.
    pub fn put_resource(&mut self, uri: impl Into<String>, node: NodeId) {
        self.resources.put(uri, node.get());
    }

    /// Look up a resource URI in the unscoped resource index.
    pub fn get_resource(&mut self, uri: &str) -> IndexResult<Option<NodeId>> {
        Ok(self.resources.get(uri)?.and_then(NodeId::new))
    }

    /// Register a `uri‖dataModelUri` key in the scoped resource index.
    pub fn put_scoped_resource(&mut self, key: impl Into<String>, node: NodeId) {
        self.resources_with_data_model.put(key, node.get());
    }

    /// Look up a `uri‖dataModelUri` key in the scoped resource index.
    pub fn get_scoped_resource(&mut self, key: &str) -> IndexResult<Option<NodeId>> {
        Ok(self
            .resources_with_data_model
            .get(key)?
            .and_then(NodeId::new))
    }

    /// Register a type-resource URI. Type resources are never data-model
    /// scoped.
    pub fn put_resource_type(&mut self, uri: impl Into<String>, node: NodeId) {
        self.resource_types.put(uri, node.get());
    }

    /// Look up a type-resource URI.
    pub fn get_resource_type(&mut self, uri: &str) -> IndexResult<Option<NodeId>> {
        Ok(self.resource_types.get(uri)?.and_then(NodeId::new))
    }

    /// Register a batch-local blank-node identifier.
    pub fn put_bnode(&mut self, local_id: impl Into<String>, node: NodeId) {
        self.bnodes.insert(local_id.into(), node);
    }

    /// Look up a batch-local blank-node identifier.
    pub fn get_bnode(&self, local_id: &str) -> Option<NodeId> {
        self.bnodes.get(local_id).copied()
    }

    /// Whether a statement hash was seen in this batch or any flushed one.
    pub fn statement_seen(&self, hash: u64) -> IndexResult<bool> {
        self.statement_hashes.contains(hash)
    }

    /// Record a statement hash in the in-memory dedup tier.
    pub fn record_statement(&mut self, hash: u64) {
        self.statement_hashes.insert(hash);
    }

    // -- identity resolution ------------------------------------------------

    /// Resolve an identity to an existing node id, dispatching on kind.
    ///
    /// Literals always resolve to `None`: literal nodes are never reused by
    /// identity, each occurrence may be a fresh node. Blank nodes resolve
    /// against the batch-local index only.
    pub fn determine_node(
        &mut self,
        kind: Option<NodeKind>,
        local_id: Option<&str>,
        uri: Option<&str>,
        data_model_uri: Option<&str>,
    ) -> IndexResult<Option<NodeId>> {
        let Some(kind) = kind else {
            return Ok(None);
        };

        match kind {
            NodeKind::Resource => {
                let Some(uri) = uri else { return Ok(None) };
                match data_model_uri {
                    None => self.get_resource(uri),
                    Some(dm) => self.get_scoped_resource(&format!("{uri}{dm}")),
                }
            }
            NodeKind::TypeResource => {
                let Some(uri) = uri else { return Ok(None) };
                self.get_resource_type(uri)
            }
            NodeKind::Literal => Ok(None),
            NodeKind::BNode | NodeKind::TypeBNode => {
                Ok(local_id.and_then(|id| self.get_bnode(id)))
            }
        }
    }

    /// Determine the resource hash a statement is attributed to, memoized per
    /// subject node for the lifetime of the batch.
    pub fn determine_resource_hash(
        &mut self,
        subject_node: NodeId,
        subject_kind: Option<NodeKind>,
        subject_hash: Option<u64>,
        resource_hash: Option<u64>,
    ) -> Option<u64> {
        if let Some(hash) = self.node_resource_map.get(&subject_node) {
            return Some(*hash);
        }

        let resolved = Self::resolve_resource_hash(subject_kind, subject_hash, resource_hash);
        if let Some(hash) = resolved {
            self.node_resource_map.insert(subject_node, hash);
        }
        resolved
    }

    /// Attribution without memoization: a resource subject is attributed to
    /// itself; anything else falls back to an explicitly supplied resource
    /// hash. `None` means the statement cannot be attributed to a resource;
    /// callers must not drop such statements silently.
    pub fn resolve_resource_hash(
        subject_kind: Option<NodeKind>,
        subject_hash: Option<u64>,
        resource_hash: Option<u64>,
    ) -> Option<u64> {
        match subject_kind {
            Some(kind) if kind.is_resource() => subject_hash,
            _ => resource_hash,
        }
    }

    // -- batch boundary -----------------------------------------------------

    /// Pump every in-memory tier into its persistent tier and clear it.
    ///
    /// This is the batch commit boundary: afterwards all prior entries are
    /// durably queryable through `get`/`contains`. Re-invoking with empty
    /// in-memory tiers is a no-op.
    pub fn pump_and_flush(&mut self) -> IndexResult<()> {
        tracing::debug!("start pumping indices");

        self.resources.flush()?;
        self.resources_with_data_model.flush()?;
        self.resource_types.flush()?;
        self.statement_hashes.flush()?;

        tracing::debug!("finished pumping indices");
        Ok(())
    }

    /// Drop all batch-local state: the blank-node index and the resource
    /// attribution memo. Called between batches so blank-node identifiers
    /// never leak across batch boundaries.
    pub fn clear_batch_state(&mut self) {
        self.bnodes.clear();
        self.node_resource_map.clear();
    }

    /// Total entries currently held in the in-memory tiers, for diagnostics.
    pub fn mem_entries(&self) -> usize {
        self.resources.mem_len()
            + self.resources_with_data_model.mem_len()
            + self.resource_types.mem_len()
            + self.statement_hashes.mem_len()
            + self.bnodes.len()
    }
}
