//! # terngraph
//!
//! A property-graph statement store: ingests triple-shaped statements with
//! provenance metadata, deduplicates them by content hash, indexes resource
//! identity across import batches, stamps every relationship with a validity
//! interval, and computes structural deltas between two versions of one
//! resource's subgraph.
//!
//! ## Architecture
//!
//! - **Identity** (`identity`): five-kind node classification and canonical
//!   identifier derivation
//! - **Hashing** (`hash`): salted xxh64 statement fingerprints and resource
//!   hashes
//! - **Indexing** (`index`): two-tier (in-memory + redb) indices with
//!   read-through backfill, pumped at batch boundaries
//! - **Versioning** (`versioning`): `[valid_from, valid_to)` intervals on
//!   relationships
//! - **Ingestion** (`ingest`): single-writer batch pipeline with per-statement
//!   outcomes
//! - **Delta** (`delta`): leaf matching between subgraph versions and path
//!   marking
//!
//! ## Library usage
//!
//! ```no_run
//! use terngraph::config::StoreConfig;
//! use terngraph::graph::PropertyGraph;
//! use terngraph::identity::NodeKind;
//! use terngraph::ingest::Importer;
//! use terngraph::statement::Statement;
//! use terngraph::versioning::VersionRange;
//!
//! let graph = PropertyGraph::new();
//! let config = StoreConfig::persistent("/var/lib/terngraph", "http://example.org/dm/1");
//! let mut importer = Importer::open(&graph, config, VersionRange::latest(1)).unwrap();
//!
//! let stmt = Statement::builder()
//!     .subject_kind(NodeKind::Resource)
//!     .subject_uri("http://example.org/s")
//!     .predicate("http://example.org/p")
//!     .object_kind(NodeKind::Literal)
//!     .object_value("42")
//!     .build();
//! importer.handle_statement(&stmt).unwrap();
//! importer.finish_batch().unwrap();
//! ```

pub mod config;
pub mod delta;
pub mod error;
pub mod export;
pub mod graph;
pub mod hash;
pub mod identity;
pub mod index;
pub mod ingest;
pub mod statement;
pub mod versioning;
