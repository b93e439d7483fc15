//! Error types for lock operations.

use thiserror::Error;

/// Errors that can occur during lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// The key is already held, either by another owner or by this handle.
    #[error("lock not acquired: key {key:?} is already held")]
    NotAcquired { key: String },

    /// The stored value does not match this handle's token, or the key is gone.
    #[error("wrong key or owner for lock {key:?}")]
    WrongKeyOrOwner { key: String },

    /// The renewal loop found the key missing.
    #[error("lock {key:?} was lost while renewing")]
    RenewalLost { key: String },

    /// Store connection failed.
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Store-specific error.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Local configuration that no store call could succeed with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The renewal task panicked or was aborted before reporting.
    #[error("renewal task failed: {0}")]
    RenewalTask(#[source] tokio::task::JoinError),
}

impl LockError {
    /// Returns `true` for the expected contention outcome of an acquire.
    pub fn is_not_acquired(&self) -> bool {
        matches!(self, Self::NotAcquired { .. })
    }

    /// Returns `true` when a release found nothing this handle owns.
    pub fn is_wrong_key_or_owner(&self) -> bool {
        matches!(self, Self::WrongKeyOrOwner { .. })
    }

    /// Returns `true` for errors raised by the store rather than the protocol.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Backend(_))
    }
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_key() {
        let err = LockError::NotAcquired {
            key: "job-42".to_string(),
        };
        assert!(err.to_string().contains("job-42"));
        assert!(err.is_not_acquired());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_transport_classification() {
        let err = LockError::Backend(Box::new(std::io::Error::other("boom")));
        assert!(err.is_transport());
        assert!(!err.is_wrong_key_or_owner());
        assert_eq!(err.to_string(), "backend error: boom");
    }
}
