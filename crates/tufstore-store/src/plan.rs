//! Commit planning.
//!
//! Planning is a pure function of the staged file set, the hash set, and the
//! consistent-snapshot flag. The durable backend lists files, asks for a plan,
//! then performs the I/O, so every naming and retention rule here is testable
//! without a filesystem.
//!
//! Publication rules for a staged path `p`:
//! - hashed copies, one per hash of `p`, when consistent snapshots are on and
//!   `p` is not the timestamp manifest
//! - the plain copy when consistent snapshots are off, or `p` is the root or
//!   timestamp manifest
//!
//! Retention rule for a published target `q`: keep it if `q` itself, or its
//! logical path (hash prefix stripped under consistent snapshots), is a key of
//! the hash set. Checking `q` first keeps plain names that merely look hashed,
//! such as `cafe.txt`.

use tufstore_types::manifest::{self, TIMESTAMP};
use tufstore_types::TargetHashes;

use crate::hashed::{hashed_path, logical_path};

/// One staged file and every repository path it is copied to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishOp {
    /// Staged-relative source path.
    pub source: String,
    /// Repository-relative destinations, hashed copies first.
    pub destinations: Vec<String>,
}

/// Publication phase of a commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishPlan {
    /// Files to copy, in staged traversal order.
    pub ops: Vec<PublishOp>,
    /// Staged files with no destination.
    pub skipped: Vec<String>,
}

impl PublishPlan {
    /// Total number of files the plan writes.
    pub fn destination_count(&self) -> usize {
        self.ops.iter().map(|op| op.destinations.len()).sum()
    }
}

/// Repository paths a staged file at `path` is published under.
pub fn destinations(path: &str, consistent_snapshot: bool, hashes: &TargetHashes) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    if consistent_snapshot && path != TIMESTAMP {
        if let Some(file_hashes) = hashes.get(path) {
            for value in file_hashes.values() {
                let hashed = hashed_path(path, value);
                if !out.contains(&hashed) {
                    out.push(hashed);
                }
            }
        }
    }
    if !consistent_snapshot || manifest::is_bootstrap(path) {
        out.push(path.to_string());
    }
    out
}

/// Plan the publication of every staged file.
pub fn plan_publish<S: AsRef<str>>(
    staged: &[S],
    consistent_snapshot: bool,
    hashes: &TargetHashes,
) -> PublishPlan {
    let mut plan = PublishPlan::default();
    for source in staged {
        let source = source.as_ref();
        let destinations = destinations(source, consistent_snapshot, hashes);
        if destinations.is_empty() {
            plan.skipped.push(source.to_string());
        } else {
            plan.ops.push(PublishOp {
                source: source.to_string(),
                destinations,
            });
        }
    }
    plan
}

/// The path a published file stands for when matched against the hash set.
pub fn logical_target(path: &str, consistent_snapshot: bool) -> String {
    if consistent_snapshot {
        if let Some((_, logical)) = logical_path(path) {
            return logical;
        }
    }
    path.to_string()
}

/// Published target files the hash set no longer references.
pub fn plan_gc<S: AsRef<str>>(
    published: &[S],
    consistent_snapshot: bool,
    hashes: &TargetHashes,
) -> Vec<String> {
    published
        .iter()
        .map(AsRef::as_ref)
        .filter(|path| {
            !hashes.contains_key(*path)
                && !hashes.contains_key(&logical_target(path, consistent_snapshot))
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tufstore_types::manifest::{ROOT, SNAPSHOT, TARGETS};
    use tufstore_types::{Hashes, HexBytes};

    fn hex(s: &str) -> HexBytes {
        HexBytes::from_hex(s).unwrap()
    }

    fn hash_set(entries: &[(&str, &[(&str, &str)])]) -> TargetHashes {
        entries
            .iter()
            .map(|(path, pairs)| {
                let hashes: Hashes = pairs
                    .iter()
                    .map(|(alg, value)| (alg.to_string(), hex(value)))
                    .collect();
                (path.to_string(), hashes)
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Publication
    // -----------------------------------------------------------------------

    #[test]
    fn plain_mode_publishes_everything_unhashed() {
        let hashes = hash_set(&[("targets/foo.txt", &[("sha256", "aa")])]);
        let staged = [ROOT, TARGETS, SNAPSHOT, TIMESTAMP, "targets/foo.txt"];
        let plan = plan_publish(&staged, false, &hashes);
        assert!(plan.skipped.is_empty());
        for (op, source) in plan.ops.iter().zip(staged) {
            assert_eq!(op.source, source);
            assert_eq!(op.destinations, vec![source.to_string()]);
        }
    }

    #[test]
    fn snapshot_mode_publishes_target_only_hashed() {
        let hashes = hash_set(&[("targets/foo.txt", &[("sha256", "abcd")])]);
        assert_eq!(
            destinations("targets/foo.txt", true, &hashes),
            vec!["targets/abcd.foo.txt".to_string()]
        );
    }

    #[test]
    fn snapshot_mode_one_copy_per_algorithm() {
        let hashes = hash_set(&[(
            "targets/foo.txt",
            &[("sha512", "bb"), ("sha256", "aa")],
        )]);
        assert_eq!(
            destinations("targets/foo.txt", true, &hashes),
            vec![
                "targets/aa.foo.txt".to_string(),
                "targets/bb.foo.txt".to_string()
            ]
        );
    }

    #[test]
    fn duplicate_hash_values_collapse() {
        let hashes = hash_set(&[("targets/foo.txt", &[("a", "aa"), ("b", "aa")])]);
        assert_eq!(destinations("targets/foo.txt", true, &hashes).len(), 1);
    }

    #[test]
    fn snapshot_mode_root_is_hashed_and_plain() {
        let hashes = hash_set(&[(ROOT, &[("sha256", "01")])]);
        assert_eq!(
            destinations(ROOT, true, &hashes),
            vec!["01.root.json".to_string(), ROOT.to_string()]
        );
    }

    #[test]
    fn snapshot_mode_root_without_hash_is_plain_only() {
        assert_eq!(
            destinations(ROOT, true, &TargetHashes::new()),
            vec![ROOT.to_string()]
        );
    }

    #[test]
    fn snapshot_mode_timestamp_is_never_hashed() {
        let hashes = hash_set(&[(TIMESTAMP, &[("sha256", "01")])]);
        assert_eq!(
            destinations(TIMESTAMP, true, &hashes),
            vec![TIMESTAMP.to_string()]
        );
    }

    #[test]
    fn snapshot_mode_metadata_uses_hash_set() {
        let hashes = hash_set(&[(SNAPSHOT, &[("sha256", "5a")])]);
        assert_eq!(
            destinations(SNAPSHOT, true, &hashes),
            vec!["5a.snapshot.json".to_string()]
        );
    }

    #[test]
    fn snapshot_mode_unhashed_file_is_skipped() {
        let staged = ["targets/orphan.bin", TIMESTAMP];
        let plan = plan_publish(&staged, true, &TargetHashes::new());
        assert_eq!(plan.skipped, vec!["targets/orphan.bin".to_string()]);
        assert_eq!(plan.ops.len(), 1);
        assert_eq!(plan.ops[0].source, TIMESTAMP);
        assert_eq!(plan.destination_count(), 1);
    }

    #[test]
    fn plain_mode_ignores_hashes() {
        let hashes = hash_set(&[("targets/foo.txt", &[("sha256", "aa"), ("sha512", "bb")])]);
        assert_eq!(
            destinations("targets/foo.txt", false, &hashes),
            vec!["targets/foo.txt".to_string()]
        );
    }

    #[test]
    fn nested_targets_keep_their_directory() {
        let hashes = hash_set(&[("targets/a/b/c.tgz", &[("sha256", "ff")])]);
        assert_eq!(
            destinations("targets/a/b/c.tgz", true, &hashes),
            vec!["targets/a/b/ff.c.tgz".to_string()]
        );
    }

    // -----------------------------------------------------------------------
    // Garbage collection
    // -----------------------------------------------------------------------

    #[test]
    fn gc_plain_mode_removes_unreferenced() {
        let hashes = hash_set(&[("targets/keep.txt", &[("sha256", "aa")])]);
        let published = ["targets/keep.txt", "targets/stale.txt"];
        assert_eq!(
            plan_gc(&published, false, &hashes),
            vec!["targets/stale.txt".to_string()]
        );
    }

    #[test]
    fn gc_snapshot_mode_strips_hash_prefix() {
        let hashes = hash_set(&[("targets/keep.txt", &[("sha256", "aa")])]);
        let published = [
            "targets/aa.keep.txt",
            "targets/0123.keep.txt", // superseded copy of a live path
            "targets/bb.stale.txt",
        ];
        assert_eq!(
            plan_gc(&published, true, &hashes),
            vec!["targets/bb.stale.txt".to_string()]
        );
    }

    #[test]
    fn gc_snapshot_mode_undecodable_name_is_its_own_logical_path() {
        let hashes = hash_set(&[("targets/README", &[("sha256", "aa")])]);
        let published = ["targets/README", "targets/LICENSE"];
        assert_eq!(
            plan_gc(&published, true, &hashes),
            vec!["targets/LICENSE".to_string()]
        );
    }

    #[test]
    fn gc_plain_mode_removes_leftover_hashed_copies() {
        let hashes = hash_set(&[("targets/foo.txt", &[("sha256", "aa")])]);
        let published = ["targets/foo.txt", "targets/aa.foo.txt"];
        assert_eq!(
            plan_gc(&published, false, &hashes),
            vec!["targets/aa.foo.txt".to_string()]
        );
    }

    #[test]
    fn gc_snapshot_mode_keeps_listed_hex_looking_name() {
        let hashes = hash_set(&[("targets/cafe.txt", &[("sha256", "aa")])]);
        let published = ["targets/cafe.txt", "targets/beef.txt"];
        assert_eq!(
            plan_gc(&published, true, &hashes),
            vec!["targets/beef.txt".to_string()]
        );
    }

    #[test]
    fn gc_snapshot_mode_cannot_tell_hex_looking_plain_name_from_hashed_copy() {
        // `ab.foo.txt` decodes to the live `foo.txt`, so it is kept.
        let hashes = hash_set(&[("targets/foo.txt", &[("sha256", "aa")])]);
        let published = ["targets/ab.foo.txt"];
        assert!(plan_gc(&published, true, &hashes).is_empty());
    }

    #[test]
    fn gc_empty_hash_set_removes_everything() {
        let published = ["targets/a", "targets/b/c"];
        assert_eq!(plan_gc(&published, true, &TargetHashes::new()).len(), 2);
    }

    #[test]
    fn logical_target_only_decodes_in_snapshot_mode() {
        assert_eq!(logical_target("targets/aa.foo.txt", true), "targets/foo.txt");
        assert_eq!(logical_target("targets/aa.foo.txt", false), "targets/aa.foo.txt");
    }
}
