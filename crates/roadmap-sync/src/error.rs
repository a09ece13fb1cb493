//! Error types for the sync layer
//!
//! Remote failures are classified once, at the [`RemoteStore`] boundary, into
//! [`RemoteError`]. The stores then re-raise them as [`SyncError`] kinds:
//!
//! - `NotFound`: path absent, recoverable (yields default state on load)
//! - `VersionConflict`: CAS precondition failed, recovered inside `save`
//! - `ConflictRetryFailed`: terminal for the call, caller must reload
//! - `RemoteUnavailable`: transport/auth/server failure, caller decides
//! - `Decode`: corrupt stored content, never replaced by an empty document
//!
//! [`RemoteStore`]: crate::remote::RemoteStore

use roadmap_model::ModelError;

/// Classified failure of a single remote call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Path does not exist on the remote
    #[error("not found: {path}")]
    NotFound {
        /// Repository-relative path that was requested
        path: String,
    },

    /// Expected version did not match the remote's current version
    #[error("version conflict on {path}")]
    VersionConflict {
        /// Repository-relative path that was written
        path: String,
    },

    /// Transport, authentication or server failure
    #[error("remote unavailable: {message}")]
    Unavailable {
        /// Human-readable cause, including the HTTP status when there is one
        message: String,
    },
}

impl RemoteError {
    /// Create not-found error for path
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create conflict error for path
    pub fn conflict(path: impl Into<String>) -> Self {
        Self::VersionConflict { path: path.into() }
    }

    /// Create unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Check if this is a not-found error
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a CAS conflict
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Errors in the transport codec
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Content is not valid base64
    #[error("invalid base64 content: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Errors surfaced by the document and snapshot stores
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Path absent on the remote
    #[error("not found: {path}")]
    NotFound {
        /// Missing path
        path: String,
    },

    /// CAS precondition failed
    #[error("version conflict on {path}")]
    VersionConflict {
        /// Path whose version moved
        path: String,
    },

    /// The single conflict retry did not succeed
    #[error("save of {path} still conflicting after retry: {cause}")]
    ConflictRetryFailed {
        /// Document path
        path: String,
        /// Failure of the retried write
        cause: RemoteError,
    },

    /// Transport, authentication or server failure
    #[error(transparent)]
    RemoteUnavailable(RemoteError),

    /// Stored content could not be decoded or parsed
    #[error("cannot decode {path}: {reason}")]
    Decode {
        /// Path of the unreadable content
        path: String,
        /// Codec or parse failure message
        reason: String,
    },

    /// Local document could not be serialized
    #[error("cannot encode document: {0}")]
    Encode(#[source] ModelError),

    /// Snapshot name cannot be used in a path
    #[error("invalid snapshot name: {0:?}")]
    InvalidSnapshotName(String),

    /// Snapshot creation failed
    #[error("snapshot {name:?} failed: {source}")]
    SnapshotFailed {
        /// Requested snapshot name
        name: String,
        /// Underlying failure
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Create decode error for path
    pub fn decode(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap a failure as a snapshot failure
    pub fn snapshot_failed(name: impl Into<String>, source: SyncError) -> Self {
        Self::SnapshotFailed {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Check if error is a CAS conflict (before or after retry)
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::VersionConflict { .. } | Self::ConflictRetryFailed { .. }
        )
    }

    /// Check if the same call may succeed later without a reload
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RemoteUnavailable(_) => true,
            Self::SnapshotFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Check if the caller must reload before writing again
    #[inline]
    #[must_use]
    pub fn requires_reload(&self) -> bool {
        matches!(self, Self::ConflictRetryFailed { .. })
    }
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound { path } => Self::NotFound { path },
            RemoteError::VersionConflict { path } => Self::VersionConflict { path },
            unavailable @ RemoteError::Unavailable { .. } => Self::RemoteUnavailable(unavailable),
        }
    }
}

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display() {
        assert_eq!(RemoteError::not_found("roadmap.json").to_string(), "not found: roadmap.json");
        assert_eq!(
            RemoteError::conflict("roadmap.json").to_string(),
            "version conflict on roadmap.json"
        );
        assert_eq!(
            RemoteError::unavailable("HTTP 502").to_string(),
            "remote unavailable: HTTP 502"
        );
    }

    #[test]
    fn remote_error_classification() {
        assert!(RemoteError::not_found("a").is_not_found());
        assert!(RemoteError::conflict("a").is_conflict());
        assert!(!RemoteError::unavailable("x").is_conflict());
    }

    #[test]
    fn error_conversions() {
        let err: SyncError = RemoteError::not_found("a").into();
        assert!(matches!(err, SyncError::NotFound { .. }));

        let err: SyncError = RemoteError::conflict("a").into();
        assert!(err.is_conflict());

        let err: SyncError = RemoteError::unavailable("timeout").into();
        assert!(matches!(err, SyncError::RemoteUnavailable(_)));
        assert_eq!(err.to_string(), "remote unavailable: timeout");
    }

    #[test]
    fn sync_error_policies() {
        let retry_failed = SyncError::ConflictRetryFailed {
            path: "roadmap.json".to_string(),
            cause: RemoteError::conflict("roadmap.json"),
        };
        assert!(retry_failed.is_conflict());
        assert!(retry_failed.requires_reload());
        assert!(!retry_failed.is_retryable());

        let unavailable = SyncError::RemoteUnavailable(RemoteError::unavailable("down"));
        assert!(unavailable.is_retryable());
        assert!(!unavailable.requires_reload());

        let decode = SyncError::decode("roadmap.json", "bad json");
        assert!(!decode.is_retryable());
    }

    #[test]
    fn snapshot_failed_wraps_source() {
        let err = SyncError::snapshot_failed(
            "2024-Q1",
            SyncError::RemoteUnavailable(RemoteError::unavailable("down")),
        );
        assert!(err.to_string().contains("2024-Q1"));
        assert!(err.is_retryable());
        assert!(std::error::Error::source(&err).is_some());
    }
}
