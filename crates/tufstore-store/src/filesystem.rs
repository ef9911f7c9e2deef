//! On-disk local store.
//!
//! Layout under the store root:
//!
//! ```text
//! keys/                 one file per signing key
//! repository/           published tree served to update clients
//! staged/               workspace for the next commit
//! staged/targets/       staged target files, written by the caller
//! ```
//!
//! A commit runs three phases:
//! 1. **Publish**: every staged file is copied into `repository/` under the
//!    names chosen by [`plan::plan_publish`]. The first I/O error aborts the
//!    commit; files already copied stay published and staging is kept for a
//!    retry.
//! 2. **Collect garbage**: files under `repository/targets/` whose logical
//!    path is missing from the hash set are deleted, then emptied directories
//!    are pruned. Failures are recorded in the [`CommitReport`] and skipped.
//! 3. **Reset staging**: same as [`LocalStore::clean`].
//!
//! No locking: one writer per store directory.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use tufstore_types::manifest::{self, TARGETS_DIR};
use tufstore_types::{Key, MetaMap, TargetHashes};
use walkdir::WalkDir;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::fanout::fan_out_copy;
use crate::keys;
use crate::paths::{self, relative_key};
use crate::plan::{self, PublishPlan};
use crate::report::CommitReport;
use crate::traits::LocalStore;

const KEYS_DIR: &str = "keys";
const REPOSITORY_DIR: &str = "repository";
const STAGED_DIR: &str = "staged";

/// Local store backed by a directory tree.
#[derive(Clone, Debug)]
pub struct FileSystemStore {
    config: StoreConfig,
}

impl FileSystemStore {
    /// Store rooted at `dir` with default permissions. Performs no I/O.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_config(StoreConfig::at(dir))
    }

    /// Store described by `config`. Performs no I/O.
    pub fn with_config(config: StoreConfig) -> Self {
        Self { config }
    }

    /// The store root.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// The active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Directory of key files.
    pub fn keys_dir(&self) -> PathBuf {
        self.config.root.join(KEYS_DIR)
    }

    /// Published tree.
    pub fn repo_dir(&self) -> PathBuf {
        self.config.root.join(REPOSITORY_DIR)
    }

    /// Staging workspace.
    pub fn staged_dir(&self) -> PathBuf {
        self.config.root.join(STAGED_DIR)
    }

    /// Where callers stage target files.
    pub fn staged_targets_dir(&self) -> PathBuf {
        self.staged_dir().join(TARGETS_DIR)
    }

    /// Create `keys/`, `repository/`, and `staged/targets/` if missing.
    pub fn init(&self) -> StoreResult<()> {
        for dir in [self.keys_dir(), self.repo_dir(), self.staged_targets_dir()] {
            self.create_dir_all(&dir)?;
        }
        Ok(())
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.config.dir_mode);
        }
        builder.create(dir)
    }

    /// Create (truncating) a file, creating its parent directories.
    fn create_file(&self, path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.config.file_mode);
        }
        options.open(path)
    }

    /// Read a document, mapping "absent" to `None`.
    fn read_optional(path: &Path) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Commit phases
    // -----------------------------------------------------------------------

    /// Staged regular files as staged-relative paths, depth-first, sorted by
    /// file name within each directory.
    fn staged_files(&self) -> StoreResult<Vec<String>> {
        let staged = self.staged_dir();
        if !staged.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&staged).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = relative_key(&staged, entry.path()).ok_or_else(|| {
                StoreError::InvalidPath {
                    path: entry.path().display().to_string(),
                    reason: "staged file name is not valid UTF-8".into(),
                }
            })?;
            files.push(rel);
        }
        Ok(files)
    }

    /// Phase 1. Fails fast.
    fn publish(&self, plan: &PublishPlan, report: &mut CommitReport) -> StoreResult<()> {
        let staged = self.staged_dir();
        let repo = self.repo_dir();
        for op in &plan.ops {
            let mut source = File::open(paths::join_key(&staged, &op.source))?;
            let mut destinations = Vec::with_capacity(op.destinations.len());
            for dest in &op.destinations {
                destinations.push(self.create_file(&paths::join_key(&repo, dest))?);
            }
            let (bytes, _) = fan_out_copy(&mut source, destinations)?;
            debug!(
                source = %op.source,
                destinations = ?op.destinations,
                bytes,
                "published staged file"
            );
            report.published.extend(op.destinations.iter().cloned());
        }
        for skipped in &plan.skipped {
            debug!(source = %skipped, "staged file has no hash entry; not published");
        }
        report.skipped.extend(plan.skipped.iter().cloned());
        Ok(())
    }

    /// Phase 2. Never fails; problems land in `report`.
    fn collect_garbage(
        &self,
        consistent_snapshot: bool,
        hashes: &TargetHashes,
        report: &mut CommitReport,
    ) {
        let repo = self.repo_dir();
        let targets = repo.join(TARGETS_DIR);
        if !targets.is_dir() {
            return;
        }

        let mut published: HashMap<String, PathBuf> = HashMap::new();
        for entry in WalkDir::new(&targets).min_depth(1).sort_by_file_name() {
            match entry {
                Ok(entry) if !entry.file_type().is_dir() => {
                    let path = entry.into_path();
                    let key = relative_key(&repo, &path)
                        .unwrap_or_else(|| path.display().to_string());
                    published.insert(key, path);
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| relative_key(&repo, p).unwrap_or_else(|| p.display().to_string()))
                        .unwrap_or_else(|| TARGETS_DIR.to_string());
                    warn!(path = %path, error = %e, "cannot walk published targets");
                    report.record_failure(path, e);
                }
            }
        }

        let mut keys: Vec<String> = published.keys().cloned().collect();
        keys.sort();
        let stale: Vec<(String, PathBuf)> = plan::plan_gc(&keys, consistent_snapshot, hashes)
            .into_iter()
            .filter_map(|key| published.remove(&key).map(|path| (key, path)))
            .collect();

        remove_stale(&stale, report, |path| fs::remove_file(path));
        self.prune_empty_dirs(&targets, report);
    }

    /// Remove directories under `targets` left empty, deepest first. `targets`
    /// itself stays.
    fn prune_empty_dirs(&self, targets: &Path, report: &mut CommitReport) {
        let repo = self.repo_dir();
        for entry in WalkDir::new(targets).min_depth(1).contents_first(true) {
            let Ok(entry) = entry else {
                // Already reported by the deletion walk.
                continue;
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            let is_empty = match fs::read_dir(path) {
                Ok(mut children) => children.next().is_none(),
                Err(_) => false,
            };
            if !is_empty {
                continue;
            }
            let key = relative_key(&repo, path).unwrap_or_else(|| path.display().to_string());
            match fs::remove_dir(path) {
                Ok(()) => {
                    debug!(path = %key, "pruned empty directory");
                    report.pruned_dirs.push(key);
                }
                Err(e) => {
                    warn!(path = %key, error = %e, "failed to prune empty directory");
                    report.record_failure(key, e);
                }
            }
        }
    }
}

/// Delete every stale file, attempting each one independently.
fn remove_stale<F>(stale: &[(String, PathBuf)], report: &mut CommitReport, mut remove: F)
where
    F: FnMut(&Path) -> io::Result<()>,
{
    for (key, path) in stale {
        match remove(path) {
            Ok(()) => {
                debug!(path = %key, "removed stale target");
                report.removed.push(key.clone());
            }
            Err(e) => {
                warn!(path = %key, error = %e, "failed to remove stale target");
                report.record_failure(key.clone(), e);
            }
        }
    }
}

impl LocalStore for FileSystemStore {
    fn get_meta(&self) -> StoreResult<MetaMap> {
        let staged = self.staged_dir();
        let repo = self.repo_dir();
        let mut meta = MetaMap::new();
        for name in manifest::TOP_LEVEL {
            let data = match Self::read_optional(&staged.join(name))? {
                Some(data) => Some(data),
                None => Self::read_optional(&repo.join(name))?,
            };
            if let Some(data) = data {
                meta.insert(name.to_string(), data);
            }
        }
        Ok(meta)
    }

    fn set_meta(&self, name: &str, meta: &[u8]) -> StoreResult<()> {
        let path = paths::resolve(&self.staged_dir(), name)?;
        self.init()?;
        let mut file = self.create_file(&path)?;
        io::Write::write_all(&mut file, meta)?;
        debug!(name, bytes = meta.len(), "staged metadata");
        Ok(())
    }

    fn get_staged_target(&self, path: &str) -> StoreResult<Box<dyn Read + Send>> {
        let full = paths::resolve(&self.staged_targets_dir(), path)?;
        let not_found = || StoreError::FileNotFound {
            path: path.to_string(),
        };
        let file = match File::open(&full) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        if !file.metadata()?.is_file() {
            return Err(not_found());
        }
        Ok(Box::new(file))
    }

    fn commit(
        &self,
        _finalized_meta: &MetaMap,
        consistent_snapshot: bool,
        hashes: &TargetHashes,
    ) -> StoreResult<CommitReport> {
        let staged = self.staged_files()?;
        let plan = plan::plan_publish(&staged, consistent_snapshot, hashes);

        let mut report = CommitReport::new();
        self.publish(&plan, &mut report)?;
        self.collect_garbage(consistent_snapshot, hashes, &mut report);
        self.clean()?;

        info!(
            consistent_snapshot,
            published = report.published.len(),
            skipped = report.skipped.len(),
            removed = report.removed.len(),
            pruned = report.pruned_dirs.len(),
            gc_failures = report.gc_failures.len(),
            "commit complete"
        );
        Ok(report)
    }

    fn get_keys(&self, role: &str) -> StoreResult<Vec<Key>> {
        keys::load_keys(&self.keys_dir(), role)
    }

    fn save_key(&self, role: &str, key: &Key) -> StoreResult<()> {
        self.init()?;
        keys::save_key(&self.keys_dir(), role, key, self.config.key_mode)?;
        Ok(())
    }

    fn clean(&self) -> StoreResult<()> {
        match fs::remove_dir_all(self.staged_dir()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.create_dir_all(&self.staged_targets_dir())?;
        Ok(())
    }
}
