//! Sync configuration
//!
//! Remote layout and commit metadata, injected into every store at
//! construction. The defaults match the layout existing clients write:
//! `roadmap.json` at the root and `snapshots/roadmap_<name>.json`.

use serde::{Deserialize, Serialize};

/// Remote layout and commit metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Path of the live document
    pub document_path: String,
    /// Directory holding snapshots
    pub snapshot_dir: String,
    /// Snapshot file name prefix
    pub snapshot_prefix: String,
    /// Snapshot file name suffix
    pub snapshot_suffix: String,
    /// Commit message for document saves
    pub commit_message: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            document_path: "roadmap.json".to_string(),
            snapshot_dir: "snapshots".to_string(),
            snapshot_prefix: "roadmap_".to_string(),
            snapshot_suffix: ".json".to_string(),
            commit_message: "Update roadmap data".to_string(),
        }
    }
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With document path
    #[inline]
    #[must_use]
    pub fn with_document_path(mut self, path: impl Into<String>) -> Self {
        self.document_path = path.into();
        self
    }

    /// With snapshot directory
    #[inline]
    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: impl Into<String>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// With snapshot file pattern `{prefix}<name>{suffix}`
    #[inline]
    #[must_use]
    pub fn with_snapshot_pattern(
        mut self,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        self.snapshot_prefix = prefix.into();
        self.snapshot_suffix = suffix.into();
        self
    }

    /// With commit message for saves
    #[inline]
    #[must_use]
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    /// Snapshot directory without trailing slashes
    #[must_use]
    pub fn snapshot_dir(&self) -> &str {
        self.snapshot_dir.trim_end_matches('/')
    }

    /// Remote path of the snapshot called `name`
    #[must_use]
    pub fn snapshot_path(&self, name: &str) -> String {
        let file = format!("{}{name}{}", self.snapshot_prefix, self.snapshot_suffix);
        match self.snapshot_dir() {
            "" => file,
            dir => format!("{dir}/{file}"),
        }
    }

    /// Extract the snapshot name from a file name, if it follows the pattern
    #[must_use]
    pub fn snapshot_name<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_prefix(self.snapshot_prefix.as_str())
            .and_then(|rest| rest.strip_suffix(self.snapshot_suffix.as_str()))
            .filter(|name| !name.is_empty())
    }
}
