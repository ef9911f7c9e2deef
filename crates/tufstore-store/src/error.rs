use tufstore_types::TypeError;

/// Errors from local store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested staged target does not exist.
    ///
    /// This is routine control flow for callers probing whether a target has
    /// been staged; match on it rather than on error text.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// A metadata name or target path was rejected before touching disk.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for [`StoreError::FileNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<walkdir::Error> for StoreError {
    fn from(err: walkdir::Error) -> Self {
        Self::Io(err.into())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
