//! Shared handle serializing operations on one document
//!
//! The version token is read and then written within a single operation,
//! so two concurrent operations on the same store could both present a
//! token that only one of them may use. [`SharedDocumentStore`] queues
//! operations behind an async mutex held for the whole call.

use crate::error::SyncResult;
use crate::store::{DocumentStore, SaveOutcome};
use roadmap_model::{RoadmapDocument, VersionToken};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable, task-safe handle on a [`DocumentStore`]
#[derive(Debug, Clone)]
pub struct SharedDocumentStore {
    inner: Arc<Mutex<DocumentStore>>,
}

impl SharedDocumentStore {
    /// Wrap a store
    #[must_use]
    pub fn new(store: DocumentStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// See [`DocumentStore::load`]
    ///
    /// # Errors
    /// As [`DocumentStore::load`]
    pub async fn load(&self) -> SyncResult<RoadmapDocument> {
        self.inner.lock().await.load().await
    }

    /// See [`DocumentStore::save`]
    ///
    /// # Errors
    /// As [`DocumentStore::save`]
    pub async fn save(&self, document: &RoadmapDocument) -> SyncResult<SaveOutcome> {
        self.inner.lock().await.save(document).await
    }

    /// See [`DocumentStore::check_for_remote_update`]
    pub async fn check_for_remote_update(&self) -> bool {
        self.inner.lock().await.check_for_remote_update().await
    }

    /// See [`DocumentStore::current_version`]
    pub async fn current_version(&self) -> Option<VersionToken> {
        self.inner.lock().await.current_version().cloned()
    }

    /// See [`DocumentStore::has_local_changes`]
    pub async fn has_local_changes(&self, document: &RoadmapDocument) -> bool {
        self.inner.lock().await.has_local_changes(document)
    }
}

impl From<DocumentStore> for SharedDocumentStore {
    fn from(store: DocumentStore) -> Self {
        Self::new(store)
    }
}
