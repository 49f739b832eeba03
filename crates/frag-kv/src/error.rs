/// Errors from key/value backend operations.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// A partition or sort key cannot be used as a storage key.
    #[error("invalid {kind} key {key:?}: {reason}")]
    InvalidKey {
        kind: &'static str,
        key: String,
        reason: &'static str,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored data failed its integrity check.
    #[error("corrupt value at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding in-process state was poisoned by a panicking writer.
    #[error("backend lock poisoned")]
    LockPoisoned,

    /// The backend refused or could not serve the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for backend operations.
pub type KvResult<T> = Result<T, KvError>;
