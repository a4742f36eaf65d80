//! Error types shared by every cachette component.

/// Boxed error reported by a storage or option backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur while deriving keys or talking to a storage tier.
///
/// A missing key is never an error: lookups return `Ok(None)` for that case.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A backend could not serve the request (unreachable, I/O failure, ...).
    #[error("storage backend '{backend}' unavailable: {source}")]
    StorageUnavailable {
        backend: String,
        #[source]
        source: BackendError,
    },

    /// Key components could not be serialized for hashing.
    #[error("failed to derive cache key: {0}")]
    KeyDerivation(String),

    /// A value could not be serialized for storage or deserialized on read.
    #[error("failed to (de)serialize cached value: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A trigger option holds something that is not a unix timestamp.
    #[error("trigger '{trigger}' has a non-timestamp value: {value}")]
    InvalidTimestamp {
        trigger: String,
        value: serde_json::Value,
    },

    /// A required collaborator was not supplied at construction time.
    #[error("missing required backend: {0}")]
    MissingBackend(&'static str),

    /// The configuration cannot produce a working cache.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Wraps a backend failure as [`CacheError::StorageUnavailable`].
    pub fn unavailable<E>(backend: impl Into<String>, source: E) -> Self
    where
        E: Into<BackendError>,
    {
        Self::StorageUnavailable {
            backend: backend.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message_names_backend() {
        let err = CacheError::unavailable("redis", "connection refused");
        assert_eq!(
            err.to_string(),
            "storage backend 'redis' unavailable: connection refused"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_missing_backend_message() {
        let err = CacheError::MissingBackend("persistent");
        assert_eq!(err.to_string(), "missing required backend: persistent");
    }
}
