//! Well-known property keys for nodes and relationships.
//!
//! The double-underscore convention marks keys written by the import
//! pipeline, keeping them apart from user-visible qualified attributes.

/// Node kind tag. Mandatory on every persisted node.
pub const NODE_KIND: &str = "__NODE_KIND__";

/// Resource URI (resource and type-resource nodes).
pub const URI: &str = "__URI__";

/// Data-model (provenance) URI scoping a resource node.
pub const DATA_MODEL: &str = "__DATA_MODEL__";

/// Literal value (literal nodes).
pub const VALUE: &str = "__VALUE__";

/// Externally stable statement UUID, on relationships.
pub const STATEMENT_UUID: &str = "__UUID__";

/// Resource hash a statement is attributed to, on relationships.
pub const RESOURCE_HASH: &str = "__RESOURCE_HASH__";

/// Lower bound (inclusive) of a relationship's validity interval.
pub const VALID_FROM: &str = "__VALID_FROM__";

/// Upper bound (exclusive) of a relationship's validity interval.
pub const VALID_TO: &str = "__VALID_TO__";

/// Delta classification overlay written by the delta engine.
pub const DELTA_STATE: &str = "__DELTA_STATE__";

/// Statement ordinal qualified attribute.
pub const ORDER: &str = "__ORDER__";

/// Statement index qualified attribute.
pub const INDEX: &str = "__INDEX__";

/// Evidence qualified attribute.
pub const EVIDENCE: &str = "__EVIDENCE__";

/// Confidence qualified attribute.
pub const CONFIDENCE: &str = "__CONFIDENCE__";
