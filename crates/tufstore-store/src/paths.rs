//! Repository-relative path handling.
//!
//! Metadata names, target paths, and hash-set keys are all `/`-separated
//! relative paths. A valid path:
//! - is non-empty
//! - does not start with `/`
//! - contains no backslash
//! - has no empty, `.`, or `..` components
//!
//! Validation runs before any filesystem access so that no caller-supplied
//! name can resolve outside the store root.

use std::path::{Component, Path, PathBuf};

use crate::error::{StoreError, StoreResult};

fn invalid(path: &str, reason: impl Into<String>) -> StoreError {
    StoreError::InvalidPath {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Validate a `/`-separated relative path.
pub fn validate_relative(path: &str) -> StoreResult<()> {
    if path.is_empty() {
        return Err(invalid(path, "path must not be empty"));
    }
    if path.starts_with('/') {
        return Err(invalid(path, "path must be relative"));
    }
    if path.contains('\\') {
        return Err(invalid(path, "path must use '/' separators"));
    }
    for component in path.split('/') {
        match component {
            "" => return Err(invalid(path, "path components must not be empty")),
            "." | ".." => {
                return Err(invalid(
                    path,
                    format!("component {component:?} is not allowed"),
                ))
            }
            _ => {}
        }
    }
    Ok(())
}

/// Resolve a validated relative path under `base`.
pub fn resolve(base: &Path, path: &str) -> StoreResult<PathBuf> {
    validate_relative(path)?;
    Ok(path.split('/').fold(base.to_path_buf(), |acc, c| acc.join(c)))
}

/// Map a key produced by [`relative_key`] (or derived from one) back under
/// `base`.
///
/// No validation: such keys hold only normal components, and any character a
/// filesystem name allows, backslash included, must round-trip.
pub fn join_key(base: &Path, key: &str) -> PathBuf {
    key.split('/').fold(base.to_path_buf(), |acc, c| acc.join(c))
}

/// Express `path` relative to `base` as a `/`-separated string.
///
/// Returns `None` when `path` is not under `base` or contains a component
/// that is not valid UTF-8; such a path can never match a hash-set key.
pub fn relative_key(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Split a `/`-separated path into its directory (possibly empty) and file
/// name.
pub fn split_file_name(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", path),
    }
}

/// Join a directory (possibly empty) and a file name with `/`.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
