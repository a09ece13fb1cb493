//! The live document store
//!
//! [`DocumentStore`] owns the version token of the live document and runs
//! the compare-and-swap protocol against the remote:
//!
//! ```text
//! save: Attempting ──ok──────────────────────────────► Saved
//!           │ conflict                                   ▲
//!           ▼                                            │ ok
//!       Conflicted ──re-read token──► Retrying ──────────┤
//!           │ re-read fails              │ conflict/fail  │
//!           └────────────────────────────┴──► ConflictRetryFailed
//!       other failure ─────────────────────────────────► Unavailable
//! ```
//!
//! Conflicts resolve last-writer-wins: the retry writes the same local
//! bytes over whatever the remote holds.

use crate::codec;
use crate::config::SyncConfig;
use crate::error::{RemoteError, SyncError, SyncResult};
use crate::remote::RemoteStore;
use roadmap_model::{RoadmapDocument, VersionToken};
use std::fmt;
use std::sync::Arc;

/// Number of re-writes after a version conflict
pub const MAX_CONFLICT_RETRIES: usize = 1;

/// Terminal state of a save
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum SaveOutcome {
    /// Remote now holds the local document at `version`
    Saved {
        /// Version token of the written document
        version: VersionToken,
        /// Whether a conflict was overwritten on the way
        retried: bool,
    },
    /// The conflict retry conflicted or failed; reload and re-apply
    ConflictRetryFailed {
        /// Document path
        path: String,
        /// Failure of the retried write
        cause: RemoteError,
    },
    /// First attempt failed for a reason other than a conflict
    Unavailable {
        /// Failure of the first write
        cause: RemoteError,
    },
}

impl SaveOutcome {
    /// Check if the document was written
    #[inline]
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    /// New remote version, if saved
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&VersionToken> {
        match self {
            Self::Saved { version, .. } => Some(version),
            _ => None,
        }
    }

    /// Convert into a plain result
    ///
    /// # Errors
    /// - `SyncError::ConflictRetryFailed` for a failed retry
    /// - `SyncError::RemoteUnavailable` for an unavailable remote
    pub fn into_result(self) -> SyncResult<VersionToken> {
        match self {
            Self::Saved { version, .. } => Ok(version),
            Self::ConflictRetryFailed { path, cause } => {
                Err(SyncError::ConflictRetryFailed { path, cause })
            }
            Self::Unavailable { cause } => Err(SyncError::RemoteUnavailable(cause)),
        }
    }
}

/// Authoritative local handle on the live roadmap document
///
/// One instance per editing session. Operations that read and then write
/// the version token take `&mut self`, so a single instance never has two
/// of them in flight; use [`crate::SharedDocumentStore`] to share one
/// between tasks.
pub struct DocumentStore {
    remote: Arc<dyn RemoteStore>,
    config: SyncConfig,
    current_version: Option<VersionToken>,
    /// Last document known to match the remote
    synced: Option<RoadmapDocument>,
}

impl DocumentStore {
    /// Create a store over `remote`
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>, config: SyncConfig) -> Self {
        Self {
            remote,
            config,
            current_version: None,
            synced: None,
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Version token of the last successful load or save
    #[inline]
    #[must_use]
    pub fn current_version(&self) -> Option<&VersionToken> {
        self.current_version.as_ref()
    }

    /// Drop the CAS anchor and the synced copy
    pub fn forget_version(&mut self) {
        self.current_version = None;
        self.synced = None;
    }

    /// Whether `document` differs from what was last loaded or saved
    ///
    /// Always true before the first load.
    #[must_use]
    pub fn has_local_changes(&self, document: &RoadmapDocument) -> bool {
        self.synced.as_ref() != Some(document)
    }

    /// Load the live document
    ///
    /// A missing document is the normal "nothing saved yet" state and
    /// yields [`RoadmapDocument::empty`] with no version token.
    ///
    /// # Errors
    /// - `SyncError::Decode` if the stored content is corrupt
    /// - `SyncError::RemoteUnavailable` for any other remote failure
    pub async fn load(&mut self) -> SyncResult<RoadmapDocument> {
        let path = self.config.document_path.as_str();

        match self.remote.get(path).await {
            Ok(blob) => {
                let document = decode_document(path, &blob.content)?;
                tracing::info!(
                    path,
                    version = blob.version.short(),
                    projects = document.projects.len(),
                    "loaded roadmap"
                );
                self.current_version = Some(blob.version);
                self.synced = Some(document.clone());
                Ok(document)
            }
            Err(RemoteError::NotFound { .. }) => {
                tracing::info!(path, "no roadmap on remote yet, starting empty");
                let document = RoadmapDocument::empty();
                self.current_version = None;
                self.synced = Some(document.clone());
                Ok(document)
            }
            Err(err) => Err(SyncError::RemoteUnavailable(err)),
        }
    }

    /// Whether the remote moved away from the last observed version
    ///
    /// Best effort: any remote failure reports `false`. Never changes
    /// local state.
    pub async fn check_for_remote_update(&self) -> bool {
        let path = self.config.document_path.as_str();

        match self.remote.get(path).await {
            Ok(blob) => self.current_version.as_ref() != Some(&blob.version),
            // The document disappeared under us
            Err(RemoteError::NotFound { .. }) => self.current_version.is_some(),
            Err(err) => {
                tracing::warn!(path, error = %err, "remote update check failed");
                false
            }
        }
    }

    /// Write `document` to the remote
    ///
    /// Remote failures are reported in the returned [`SaveOutcome`]. On a
    /// version conflict the current token is re-read and the same bytes are
    /// written once more; there is never a third attempt.
    ///
    /// # Errors
    /// Returns `SyncError::Encode` only if the document cannot be serialized;
    /// nothing is sent in that case.
    pub async fn save(&mut self, document: &RoadmapDocument) -> SyncResult<SaveOutcome> {
        let content = encode_document(document)?;
        let path = self.config.document_path.clone();
        let mut attempt = 0;

        loop {
            let result = self
                .remote
                .put(
                    &path,
                    &content,
                    self.current_version.as_ref(),
                    &self.config.commit_message,
                )
                .await;

            match result {
                Ok(version) => {
                    tracing::info!(path, version = version.short(), attempt, "saved roadmap");
                    self.current_version = Some(version.clone());
                    self.synced = Some(document.clone());
                    return Ok(SaveOutcome::Saved {
                        version,
                        retried: attempt > 0,
                    });
                }
                Err(cause) if attempt == MAX_CONFLICT_RETRIES => {
                    tracing::warn!(path, error = %cause, "save retry failed, reload required");
                    return Ok(SaveOutcome::ConflictRetryFailed { path, cause });
                }
                Err(cause) if cause.is_conflict() => {
                    tracing::warn!(
                        path,
                        expected = self.current_version.as_ref().map(VersionToken::short),
                        "version conflict, overwriting with local document"
                    );
                    attempt += 1;
                    if let Err(cause) = self.refresh_version(&path).await {
                        tracing::warn!(path, error = %cause, "cannot re-read version after conflict");
                        return Ok(SaveOutcome::ConflictRetryFailed { path, cause });
                    }
                }
                Err(cause) => {
                    tracing::warn!(path, error = %cause, "save failed");
                    return Ok(SaveOutcome::Unavailable { cause });
                }
            }
        }
    }

    /// Adopt the remote's current version as the CAS anchor
    async fn refresh_version(&mut self, path: &str) -> Result<(), RemoteError> {
        self.current_version = match self.remote.get(path).await {
            Ok(blob) => Some(blob.version),
            Err(RemoteError::NotFound { .. }) => None,
            Err(err) => return Err(err),
        };
        Ok(())
    }
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("config", &self.config)
            .field("current_version", &self.current_version)
            .finish_non_exhaustive()
    }
}

/// Decode transported content into a document
pub(crate) fn decode_document(path: &str, content: &str) -> SyncResult<RoadmapDocument> {
    let text = codec::decode(content).map_err(|e| SyncError::decode(path, e))?;
    RoadmapDocument::from_json(&text).map_err(|e| SyncError::decode(path, e))
}

/// Serialize and encode a document for transport
pub(crate) fn encode_document(document: &RoadmapDocument) -> SyncResult<String> {
    let text = document.to_json_pretty().map_err(SyncError::Encode)?;
    Ok(codec::encode(&text))
}
