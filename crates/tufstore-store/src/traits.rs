use std::io::Read;

use tufstore_types::{Key, MetaMap, TargetHashes};

use crate::error::StoreResult;
use crate::report::CommitReport;

/// Local persistence for a trust repository: staged and published metadata,
/// staged targets, and per-role signing keys.
///
/// All implementations share these rules:
/// - Metadata bytes are opaque. Nothing here parses or validates them.
/// - Hashes are supplied by the caller and never recomputed.
/// - There is no internal locking of on-disk state. Callers must serialize
///   `set_meta`, `commit`, and `clean` per store directory.
/// - All I/O errors are propagated unchanged, never retried.
pub trait LocalStore: Send + Sync {
    /// The effective metadata set.
    ///
    /// Staged documents shadow published ones. Manifests present in neither
    /// place are omitted rather than reported as errors.
    fn get_meta(&self) -> StoreResult<MetaMap>;

    /// Write or overwrite a metadata document in staging.
    fn set_meta(&self, name: &str, meta: &[u8]) -> StoreResult<()>;

    /// Open a staged target by its path under the staged `targets/` directory.
    ///
    /// Returns [`StoreError::FileNotFound`](crate::StoreError::FileNotFound)
    /// when nothing is staged at `path`.
    fn get_staged_target(&self, path: &str) -> StoreResult<Box<dyn Read + Send>>;

    /// Promote staging into the published repository.
    ///
    /// `finalized_meta` is informational: every document to publish must
    /// already have been written with [`set_meta`](Self::set_meta).
    /// `hashes` drives hashed file names under `consistent_snapshot` and
    /// decides which published targets survive garbage collection.
    fn commit(
        &self,
        finalized_meta: &MetaMap,
        consistent_snapshot: bool,
        hashes: &TargetHashes,
    ) -> StoreResult<CommitReport>;

    /// Every key saved for `role`. Empty when none have been saved.
    fn get_keys(&self, role: &str) -> StoreResult<Vec<Key>>;

    /// Save a key for `role`. No deduplication against existing keys.
    fn save_key(&self, role: &str, key: &Key) -> StoreResult<()>;

    /// Discard all staged state and recreate an empty staged `targets/`.
    ///
    /// Idempotent.
    fn clean(&self) -> StoreResult<()>;

    /// Returns `true` if a target is staged at `path`.
    ///
    /// Default implementation probes [`get_staged_target`](Self::get_staged_target)
    /// and maps `FileNotFound` to `false`.
    fn has_staged_target(&self, path: &str) -> StoreResult<bool> {
        match self.get_staged_target(path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
