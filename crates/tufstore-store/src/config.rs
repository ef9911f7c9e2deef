use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for a [`FileSystemStore`](crate::FileSystemStore).
///
/// Usually loaded from a `tufstore.toml`:
///
/// ```toml
/// root = "/var/lib/tuf"
/// consistent_snapshot = true
/// ```
///
/// Permission modes only take effect on unix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `keys/`, `repository/`, and `staged/`.
    pub root: PathBuf,
    /// Default publication mode for callers that do not decide per commit.
    pub consistent_snapshot: bool,
    /// Mode for directories the store creates.
    pub dir_mode: u32,
    /// Mode for metadata documents and published files.
    pub file_mode: u32,
    /// Mode for key files. Keys hold private material, so owner-only.
    pub key_mode: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            consistent_snapshot: false,
            dir_mode: 0o755,
            file_mode: 0o644,
            key_mode: 0o600,
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `root`.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.root, PathBuf::from("."));
        assert!(!c.consistent_snapshot);
        assert_eq!(c.dir_mode, 0o755);
        assert_eq!(c.file_mode, 0o644);
        assert_eq!(c.key_mode, 0o600);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = StoreConfig::from_toml(
            r#"
            root = "/srv/tuf"
            consistent_snapshot = true
            "#,
        )
        .unwrap();
        assert_eq!(c.root, PathBuf::from("/srv/tuf"));
        assert!(c.consistent_snapshot);
        assert_eq!(c.key_mode, 0o600);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = StoreConfig::from_toml("root = [").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tufstore.toml");
        std::fs::write(&path, "file_mode = 416\n").unwrap();
        let c = StoreConfig::load(&path).unwrap();
        assert_eq!(c.file_mode, 0o640);
        assert_eq!(c.root, PathBuf::from("."));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
