//! Roadmap Sync
//!
//! Keeps a local copy of the roadmap document synchronized with a remote,
//! version-controlled blob under optimistic concurrency control.
//!
//! # Core Operations
//!
//! - **Load**: fetch, decode and parse the live document, remembering its version token
//! - **Save**: compare-and-swap write keyed on that token, one bounded retry on conflict
//! - **Check**: best-effort detection of remote changes
//! - **Snapshot**: copy the remote head to a write-once path, list and read snapshots
//!
//! # Architecture
//!
//! ```text
//! application ─► DocumentStore ──┐
//!                                ├─► RemoteStore (GitHubRemote, InMemoryRemote, ...)
//!               SnapshotManager ─┘        │
//!                      ▲                  ▼
//!                      └──── codec (base64 / UTF-8, legacy fallback)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use roadmap_sync::{DocumentStore, GitHubConfig, GitHubRemote, SaveOutcome, SyncConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let remote = Arc::new(GitHubRemote::new(GitHubConfig::new("acme", "plans").with_token(token))?);
//! let mut store = DocumentStore::new(remote, SyncConfig::new());
//!
//! let mut doc = store.load().await?;
//! doc.settings.theme = "dark".to_string();
//!
//! match store.save(&doc).await? {
//!     SaveOutcome::Saved { version, .. } => println!("saved at {version}"),
//!     SaveOutcome::ConflictRetryFailed { .. } => { /* reload and re-apply */ }
//!     SaveOutcome::Unavailable { cause } => eprintln!("try later: {cause}"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod codec;
pub mod config;
pub mod error;
pub mod github;
pub mod remote;
pub mod shared;
pub mod snapshot;
pub mod store;

// Re-exports for convenience
pub use config::SyncConfig;
pub use error::{CodecError, RemoteError, SyncError, SyncResult};
pub use github::{GitHubConfig, GitHubRemote};
pub use remote::{RemoteBlob, RemoteEntry, RemoteStore};
pub use roadmap_model::{RoadmapDocument, Settings, VersionToken};
pub use shared::SharedDocumentStore;
pub use snapshot::{SnapshotDescriptor, SnapshotManager};
pub use store::{DocumentStore, SaveOutcome, MAX_CONFLICT_RETRIES};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the sync layer
    pub use crate::config::SyncConfig;
    pub use crate::error::{RemoteError, SyncError, SyncResult};
    pub use crate::remote::RemoteStore;
    pub use crate::shared::SharedDocumentStore;
    pub use crate::snapshot::{SnapshotDescriptor, SnapshotManager};
    pub use crate::store::{DocumentStore, SaveOutcome};
    pub use roadmap_model::{Project, RoadmapDocument, Settings, VersionToken};
}
