//! Point-in-time snapshots of the live document
//!
//! Snapshots live outside the CAS protocol: they are copied from the remote
//! head at creation time, written once, and never tracked by a
//! [`crate::DocumentStore`]. Descriptors are always re-derived by listing
//! the snapshot directory.

use crate::config::SyncConfig;
use crate::error::{RemoteError, SyncError, SyncResult};
use crate::remote::RemoteStore;
use crate::store::decode_document;
use roadmap_model::{RoadmapDocument, VersionToken};
use std::fmt;
use std::sync::Arc;

/// A snapshot found in the snapshot directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotDescriptor {
    /// User-supplied snapshot name
    pub name: String,
    /// Remote path of the snapshot file
    pub path: String,
    /// Version of the snapshot file
    pub version: VersionToken,
}

/// Creates, lists and reads snapshots
pub struct SnapshotManager {
    remote: Arc<dyn RemoteStore>,
    config: SyncConfig,
}

impl SnapshotManager {
    /// Create a manager over `remote`
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>, config: SyncConfig) -> Self {
        Self { remote, config }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Copy the remote head of the live document to a snapshot named `name`
    ///
    /// Reads the remote afresh so the snapshot reflects the true head, not a
    /// local view. The copy is byte-identical to the stored content.
    ///
    /// # Errors
    /// Returns `SyncError::SnapshotFailed` wrapping the cause; a name that
    /// is already taken fails with a wrapped conflict.
    pub async fn create_snapshot(&self, name: &str) -> SyncResult<SnapshotDescriptor> {
        self.try_create(name)
            .await
            .map_err(|err| SyncError::snapshot_failed(name, err))
    }

    async fn try_create(&self, name: &str) -> SyncResult<SnapshotDescriptor> {
        validate_name(name)?;

        let source = self.config.document_path.as_str();
        let blob = self.remote.get(source).await?;

        let path = self.config.snapshot_path(name);
        let message = format!("Create snapshot: {name}");
        let version = self.remote.put(&path, &blob.content, None, &message).await?;

        tracing::info!(
            name,
            path,
            source_version = blob.version.short(),
            "created snapshot"
        );

        Ok(SnapshotDescriptor {
            name: name.to_string(),
            path,
            version,
        })
    }

    /// List snapshots, sorted by name
    ///
    /// Files not matching the snapshot pattern are ignored. A missing
    /// snapshot directory means no snapshots.
    ///
    /// # Errors
    /// Returns `SyncError::RemoteUnavailable` if the listing fails
    pub async fn list_snapshots(&self) -> SyncResult<Vec<SnapshotDescriptor>> {
        let dir = self.config.snapshot_dir();

        let entries = match self.remote.list(dir).await {
            Ok(entries) => entries,
            Err(RemoteError::NotFound { .. }) => return Ok(Vec::new()),
            Err(err) => return Err(SyncError::RemoteUnavailable(err)),
        };

        let mut snapshots: Vec<SnapshotDescriptor> = entries
            .into_iter()
            .filter_map(|entry| {
                let name = self.config.snapshot_name(&entry.name)?.to_string();
                Some(SnapshotDescriptor {
                    name,
                    path: entry.path,
                    version: entry.version,
                })
            })
            .collect();
        snapshots.sort();

        tracing::debug!(dir, count = snapshots.len(), "listed snapshots");
        Ok(snapshots)
    }

    /// Read the snapshot at `path`
    ///
    /// Read-only: no document store's version token is touched.
    ///
    /// # Errors
    /// - `SyncError::NotFound` if there is no snapshot at `path`
    /// - `SyncError::Decode` if its content is corrupt
    /// - `SyncError::RemoteUnavailable` for any other remote failure
    pub async fn load_snapshot(&self, path: &str) -> SyncResult<RoadmapDocument> {
        let blob = self.remote.get(path).await.map_err(|err| match err {
            RemoteError::NotFound { path } => SyncError::NotFound { path },
            other => SyncError::RemoteUnavailable(other),
        })?;

        decode_document(path, &blob.content)
    }
}

impl fmt::Debug for SnapshotManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Snapshot names become part of a path
fn validate_name(name: &str) -> SyncResult<()> {
    let usable = !name.trim().is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.chars().any(char::is_control);

    if usable {
        Ok(())
    } else {
        Err(SyncError::InvalidSnapshotName(name.to_string()))
    }
}
