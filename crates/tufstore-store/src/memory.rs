use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tufstore_types::{Key, MetaMap, TargetHashes};

use crate::error::{StoreError, StoreResult};
use crate::report::CommitReport;
use crate::traits::LocalStore;

/// In-memory local store.
///
/// Intended for tests and embedding. There is no staged/published split:
/// metadata lives in one map, target bytes are preloaded, and `commit` and
/// `clean` do nothing. Maps sit behind `RwLock`s so a store can be shared
/// across threads.
pub struct MemoryStore {
    meta: RwLock<MetaMap>,
    files: RwLock<HashMap<String, Vec<u8>>>,
    keys: RwLock<HashMap<String, Vec<Key>>>,
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StoreError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StoreError::LockPoisoned)
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_contents(MetaMap::new(), HashMap::new())
    }

    /// Create a store preloaded with metadata and staged target bytes.
    pub fn with_contents(meta: MetaMap, files: HashMap<String, Vec<u8>>) -> Self {
        Self {
            meta: RwLock::new(meta),
            files: RwLock::new(files),
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Stage target bytes at `path`, replacing any previous content.
    pub fn stage_target(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> StoreResult<()> {
        write(&self.files)?.insert(path.into(), data.into());
        Ok(())
    }

    /// Number of metadata documents held.
    pub fn meta_count(&self) -> usize {
        self.meta.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Number of staged targets held.
    pub fn target_count(&self) -> usize {
        self.files.read().map(|f| f.len()).unwrap_or(0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore for MemoryStore {
    fn get_meta(&self) -> StoreResult<MetaMap> {
        Ok(read(&self.meta)?.clone())
    }

    fn set_meta(&self, name: &str, meta: &[u8]) -> StoreResult<()> {
        write(&self.meta)?.insert(name.to_string(), meta.to_vec());
        Ok(())
    }

    fn get_staged_target(&self, path: &str) -> StoreResult<Box<dyn Read + Send>> {
        let files = read(&self.files)?;
        let data = files.get(path).ok_or_else(|| StoreError::FileNotFound {
            path: path.to_string(),
        })?;
        Ok(Box::new(Cursor::new(data.clone())))
    }

    fn commit(
        &self,
        _finalized_meta: &MetaMap,
        _consistent_snapshot: bool,
        _hashes: &TargetHashes,
    ) -> StoreResult<CommitReport> {
        Ok(CommitReport::new())
    }

    fn get_keys(&self, role: &str) -> StoreResult<Vec<Key>> {
        Ok(read(&self.keys)?.get(role).cloned().unwrap_or_default())
    }

    fn save_key(&self, role: &str, key: &Key) -> StoreResult<()> {
        write(&self.keys)?
            .entry(role.to_string())
            .or_default()
            .push(key.clone());
        Ok(())
    }

    fn clean(&self) -> StoreResult<()> {
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("meta_count", &self.meta_count())
            .field("target_count", &self.target_count())
            .finish()
    }
}
