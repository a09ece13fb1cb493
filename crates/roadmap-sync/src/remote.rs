//! The remote store contract
//!
//! The sync layer only needs three calls from the remote: fetch a blob by
//! path, write a blob with a version precondition, and list a directory.
//! Transport, authentication and retries at the HTTP level belong to the
//! implementation; every failure leaves it classified as a [`RemoteError`].

use crate::error::RemoteError;
use async_trait::async_trait;
use roadmap_model::VersionToken;

/// Blob content and the version it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBlob {
    /// Transport-encoded content (see [`crate::codec`])
    pub content: String,
    /// Version of exactly this content
    pub version: VersionToken,
}

/// One file in a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// File name without directory
    pub name: String,
    /// Full path, usable with [`RemoteStore::get`]
    pub path: String,
    /// Version of the file's content
    pub version: VersionToken,
}

/// Path-addressed, versioned blob store
///
/// # Contract
/// - `put` is an atomic compare-and-swap on `expected`
/// - `put` with `expected = None` creates a fresh path unconditionally;
///   on an existing path the outcome is store-defined
/// - calls are independent; the store keeps no per-client session state
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a blob
    ///
    /// # Errors
    /// - `RemoteError::NotFound` if the path does not exist
    /// - `RemoteError::Unavailable` on any transport failure
    async fn get(&self, path: &str) -> Result<RemoteBlob, RemoteError>;

    /// Write a blob if the remote is still at `expected`
    ///
    /// Returns the version of the newly written content.
    ///
    /// # Errors
    /// - `RemoteError::VersionConflict` if the precondition fails
    /// - `RemoteError::Unavailable` on any transport failure
    async fn put(
        &self,
        path: &str,
        content: &str,
        expected: Option<&VersionToken>,
        message: &str,
    ) -> Result<VersionToken, RemoteError>;

    /// List the files of a directory
    ///
    /// # Errors
    /// - `RemoteError::NotFound` if the directory does not exist
    /// - `RemoteError::Unavailable` on any transport failure
    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError>;
}
