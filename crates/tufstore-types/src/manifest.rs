//! Names of the top-level role manifests.
//!
//! `root.json` and `timestamp.json` are the bootstrap manifests: clients fetch
//! them by plain name before they know any hash, so the store publishes them
//! unhashed in every mode.

/// The root of trust.
pub const ROOT: &str = "root.json";
/// The targets role.
pub const TARGETS: &str = "targets.json";
/// The snapshot role.
pub const SNAPSHOT: &str = "snapshot.json";
/// The freshness beacon.
pub const TIMESTAMP: &str = "timestamp.json";

/// Every top-level manifest, in the order the store reads them.
pub const TOP_LEVEL: [&str; 4] = [ROOT, TARGETS, SNAPSHOT, TIMESTAMP];

/// Name of the directory holding target files, in both staging and the
/// published repository.
pub const TARGETS_DIR: &str = "targets";

/// Returns `true` for manifests that are always published under their plain
/// name.
pub fn is_bootstrap(path: &str) -> bool {
    path == ROOT || path == TIMESTAMP
}
