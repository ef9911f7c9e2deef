//! Per-role signing-key files.
//!
//! Each key lives in its own file `<role>-<key-id>.json` inside the key
//! directory: pretty-printed JSON, trailing newline, owner-only permissions.
//! There is no index; [`load_keys`] scans the directory.
//!
//! Ownership is decided by parsing the file name, not by raw prefix matching:
//! the role is everything before the last `-` (key IDs are hex and never
//! contain one). `root` therefore never picks up `rootx-<id>.json` or
//! `root-backup-<id>.json`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;
use tufstore_types::Key;

use crate::error::{StoreError, StoreResult};

const KEY_FILE_SUFFIX: &str = ".json";

/// File name for a key of `role` with ID `key_id`.
pub fn key_file_name(role: &str, key_id: &str) -> String {
    format!("{role}-{key_id}{KEY_FILE_SUFFIX}")
}

/// Split a key file name into `(role, key_id)`.
///
/// Returns `None` for names that do not follow the convention.
pub fn parse_key_file_name(file_name: &str) -> Option<(&str, &str)> {
    let stem = file_name.strip_suffix(KEY_FILE_SUFFIX)?;
    let (role, key_id) = stem.rsplit_once('-')?;
    if role.is_empty() || key_id.is_empty() || !key_id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some((role, key_id))
}

fn validate_role(role: &str) -> StoreResult<()> {
    if role.is_empty() || role.contains('/') || role.contains('\\') || role == "." || role == ".." {
        return Err(StoreError::InvalidPath {
            path: role.to_string(),
            reason: "role must be a non-empty single path component".into(),
        });
    }
    Ok(())
}

/// Load every key stored for `role`, ordered by file name.
///
/// A missing key directory means no keys have been saved yet.
pub fn load_keys(dir: &Path, role: &str) -> StoreResult<Vec<Key>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if matches!(parse_key_file_name(name), Some((owner, _)) if owner == role) {
            paths.push(entry.path());
        }
    }
    paths.sort();

    paths
        .iter()
        .map(|path| {
            let data = fs::read(path)?;
            serde_json::from_slice(&data).map_err(|e| {
                StoreError::Serialization(format!("key file {}: {e}", path.display()))
            })
        })
        .collect()
}

/// Write `key` for `role` into `dir` and return the file path.
///
/// Saving the same key twice for a role rewrites the same file.
pub fn save_key(dir: &Path, role: &str, key: &Key, mode: u32) -> StoreResult<PathBuf> {
    validate_role(role)?;
    let key_id = key.id()?;
    let mut data =
        serde_json::to_vec_pretty(key).map_err(|e| StoreError::Serialization(e.to_string()))?;
    data.push(b'\n');

    let path = dir.join(key_file_name(role, &key_id));
    write_private_file(&path, &data, mode)?;
    debug!(role, key_id = %key_id, path = %path.display(), "saved signing key");
    Ok(path)
}

#[cfg(unix)]
fn write_private_file(path: &Path, data: &[u8], mode: u32) -> StoreResult<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)?;
    // `mode` only applies on creation; tighten a pre-existing file as well.
    file.set_permissions(fs::Permissions::from_mode(mode))?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private_file(path: &Path, data: &[u8], _mode: u32) -> StoreResult<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}
