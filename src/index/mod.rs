//! Batch indexing: layered two-tier indices and the index manager.
//!
//! Five named indices resolve identities during an import batch:
//!
//! - `resources` — URI → node id, unscoped
//! - `resources_with_data_model` — `uri‖dataModelUri` → node id
//! - `resource_types` — type URI → node id
//! - `statement_hashes` — dedup membership over statement fingerprints
//! - `bnodes` — batch-local blank-node ids, in-memory only, never persisted
//!
//! The first four are [`LayeredIndex`]/[`LayeredHashIndex`] instances: an
//! in-memory tier filled during the batch over a persistent redb tier pumped
//! at the batch boundary.

pub mod layered;
pub mod manager;

pub use layered::{IndexResult, LayeredHashIndex, LayeredIndex};
pub use manager::BatchIndexManager;
