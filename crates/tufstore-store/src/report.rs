use serde::{Deserialize, Serialize};

/// What a commit did.
///
/// Publication errors abort the commit and never show up here. Garbage
/// collection is best-effort: each failed deletion is recorded in
/// [`gc_failures`](Self::gc_failures) and the commit carries on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    /// Repository paths written, in publish order.
    pub published: Vec<String>,
    /// Staged paths that had no destination (no hash entry under consistent
    /// snapshots).
    pub skipped: Vec<String>,
    /// Repository paths deleted by garbage collection.
    pub removed: Vec<String>,
    /// Directories under `targets/` removed because they became empty.
    pub pruned_dirs: Vec<String>,
    /// Garbage-collection steps that failed.
    pub gc_failures: Vec<GcFailure>,
}

/// A garbage-collection step that failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcFailure {
    /// Repository-relative path (or absolute path when it could not be made
    /// relative).
    pub path: String,
    /// Rendered error.
    pub error: String,
}

impl CommitReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if garbage collection finished without failures.
    pub fn is_clean(&self) -> bool {
        self.gc_failures.is_empty()
    }

    pub(crate) fn record_failure(&mut self, path: impl Into<String>, error: impl ToString) {
        self.gc_failures.push(GcFailure {
            path: path.into(),
            error: error.to_string(),
        });
    }
}
