//! Bitemporal relationship versioning.
//!
//! Every persisted relationship carries a validity interval
//! `[valid_from, valid_to)`. This module is a pure attacher: it stamps the
//! interval onto a relationship and resolves effective-at-version reads.
//! Statements are never mutated in place to close an interval; superseding a
//! statement means writing a new relationship with a new interval, and
//! reconciling overlapping intervals for the same subject and predicate is
//! the import orchestrator's responsibility.

use serde::{Deserialize, Serialize};

use crate::graph::{GraphResult, PropertyGraph, RelId, props};

/// Sentinel upper bound of an open validity interval.
pub const LATEST_VERSION: u32 = u32::MAX;

/// A half-open validity interval `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    /// First version (inclusive) at which the relationship is valid.
    pub from: u32,
    /// First version (exclusive) at which the relationship is no longer valid.
    pub to: u32,
}

impl VersionRange {
    /// Create a range `[from, to)`.
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    /// Create an open range `[from, LATEST_VERSION)`.
    pub fn latest(from: u32) -> Self {
        Self {
            from,
            to: LATEST_VERSION,
        }
    }

    /// Whether the range covers the given version.
    pub fn contains(&self, version: u32) -> bool {
        self.from <= version && version < self.to
    }

    /// Whether the range has no closing version.
    pub fn is_open(&self) -> bool {
        self.to == LATEST_VERSION
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_open() {
            write!(f, "[{}, latest)", self.from)
        } else {
            write!(f, "[{}, {})", self.from, self.to)
        }
    }
}

/// Stamp a validity interval onto a relationship.
///
/// Sets `valid_from`/`valid_to` and leaves the relationship otherwise
/// unchanged.
pub fn apply_version(
    graph: &PropertyGraph,
    rel: RelId,
    range: VersionRange,
) -> GraphResult<()> {
    graph.set_rel_property(rel, props::VALID_FROM, u64::from(range.from))?;
    graph.set_rel_property(rel, props::VALID_TO, u64::from(range.to))?;
    Ok(())
}

/// Read a relationship's validity interval, if it carries one.
pub fn range_of(graph: &PropertyGraph, rel: RelId) -> GraphResult<Option<VersionRange>> {
    let from = graph
        .rel_property(rel, props::VALID_FROM)?
        .and_then(|v| v.as_uint());
    let to = graph
        .rel_property(rel, props::VALID_TO)?
        .and_then(|v| v.as_uint());
    Ok(match (from, to) {
        (Some(from), Some(to)) => Some(VersionRange::new(from as u32, to as u32)),
        _ => None,
    })
}

/// Filter the relationships whose validity interval covers `version`.
///
/// Relationships without an interval are skipped: an unstamped relationship
/// is not effective at any version.
pub fn effective_at(
    graph: &PropertyGraph,
    candidates: impl IntoIterator<Item = RelId>,
    version: u32,
) -> GraphResult<Vec<RelId>> {
    let mut effective = Vec::new();
    for rel in candidates {
        if let Some(range) = range_of(graph, rel)? {
            if range.contains(version) {
                effective.push(rel);
            }
        }
    }
    Ok(effective)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_contains_half_open() {
        let range = VersionRange::new(2, 5);
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
    }

    #[test]
    fn latest_is_open() {
        let range = VersionRange::latest(3);
        assert!(range.is_open());
        assert!(range.contains(3));
        assert!(range.contains(1_000_000));
        assert!(!range.contains(2));
    }

    #[test]
    fn display_formats() {
        assert_eq!(VersionRange::new(1, 4).to_string(), "[1, 4)");
        assert_eq!(VersionRange::latest(2).to_string(), "[2, latest)");
    }

    #[test]
    fn apply_and_read_back() {
        let graph = PropertyGraph::new();
        let a = graph.create_node([]).unwrap();
        let b = graph.create_node([]).unwrap();
        let rel = graph.create_relationship(a, b, "p", []).unwrap();

        apply_version(&graph, rel, VersionRange::new(1, 3)).unwrap();
        assert_eq!(range_of(&graph, rel).unwrap(), Some(VersionRange::new(1, 3)));
    }

    #[test]
    fn unstamped_relationship_has_no_range() {
        let graph = PropertyGraph::new();
        let a = graph.create_node([]).unwrap();
        let b = graph.create_node([]).unwrap();
        let rel = graph.create_relationship(a, b, "p", []).unwrap();
        assert_eq!(range_of(&graph, rel).unwrap(), None);
    }

    #[test]
    fn effective_at_selects_covering_ranges() {
        let graph = PropertyGraph::new();
        let a = graph.create_node([]).unwrap();
        let b = graph.create_node([]).unwrap();

        let old = graph.create_relationship(a, b, "p", []).unwrap();
        apply_version(&graph, old, VersionRange::new(1, 2)).unwrap();

        let current = graph.create_relationship(a, b, "p", []).unwrap();
        apply_version(&graph, current, VersionRange::latest(2)).unwrap();

        let unstamped = graph.create_relationship(a, b, "p", []).unwrap();

        let at_1 = effective_at(&graph, [old, current, unstamped], 1).unwrap();
        assert_eq!(at_1, vec![old]);

        let at_5 = effective_at(&graph, [old, current, unstamped], 5).unwrap();
        assert_eq!(at_5, vec![current]);
    }
}
