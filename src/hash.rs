//! Salted statement and resource hashing.
//!
//! Fingerprints use xxh64 (seed 0) over canonical UTF-8 strings. The hash
//! function is fixed: changing it invalidates every persisted dedup index.
//! xxh64 is not collision-free; the statement index treats a hash hit as
//! "already present", so a collision silently drops a statement. The
//! canonical string format below is pinned by tests to keep fingerprints
//! stable across releases.
//!
//! Canonical statement string:
//!
//! ```text
//! {subjectKind}:{subjectId} {predicate} {objectKind}:{objectId} {salt}
//! ```
//!
//! The salt is the active data-model URI. Resource identities may already
//! embed a data-model URI, so data-model-scoped statements are double-salted;
//! this mirrors the behavior of the system this store replaces and guards
//! against cross-data-model collisions.

use xxhash_rust::xxh64::xxh64;

use crate::error::IdentityError;
use crate::identity::NodeKind;

/// Result type for hashing operations.
pub type HashResult<T> = std::result::Result<T, IdentityError>;

/// Compute the deduplication fingerprint of a statement.
///
/// Fails with [`IdentityError::IncompleteIdentity`] when any of the four
/// identity inputs is absent. Identity resolution must happen before hashing;
/// an incomplete input here is a caller error, and aborts only the statement
/// being processed.
pub fn statement_hash(
    predicate: &str,
    subject_kind: Option<NodeKind>,
    object_kind: Option<NodeKind>,
    subject_id: Option<&str>,
    object_id: Option<&str>,
    salt: &str,
) -> HashResult<u64> {
    let (subject_kind, object_kind, subject_id, object_id) =
        match (subject_kind, object_kind, subject_id, object_id) {
            (Some(sk), Some(ok), Some(si), Some(oi)) => (sk, ok, si, oi),
            _ => return Err(IdentityError::IncompleteIdentity),
        };

    let canonical =
        format!("{subject_kind}:{subject_id} {predicate} {object_kind}:{object_id} {salt}");

    Ok(xxh64(canonical.as_bytes(), 0))
}

/// Compute the hash identifying a resource within a data model.
///
/// Stable across re-imports of the same `(uri, data_model_uri)` pair; the
/// data-model URI defaults to the store's configured one at the call site.
pub fn resource_hash(uri: &str, data_model_uri: &str) -> u64 {
    let canonical = format!("{uri}{data_model_uri}");
    xxh64(canonical.as_bytes(), 0)
}
