//! Testing utilities for the roadmap sync workspace
//!
//! Shared remote double, fixtures and helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use roadmap_model::{PlanningInterval, Project, RoadmapDocument, Settings, VersionToken};
use roadmap_sync::codec;
use roadmap_sync::{RemoteBlob, RemoteEntry, RemoteError, RemoteStore};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, VecDeque};

/// A call received by [`InMemoryRemote`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Get { path: String },
    Put { path: String, expected: Option<VersionToken> },
    List { dir: String },
}

/// Scripted behavior for the next `get` or `list`
#[derive(Debug, Clone)]
enum ReadScript {
    Fail(RemoteError),
}

/// Scripted behavior for the next `put`
#[derive(Debug, Clone)]
enum PutScript {
    Proceed,
    Fail(RemoteError),
    /// Another client commits `content` to `path` just before the put lands
    ForeignWrite { path: String, content: String },
}

#[derive(Debug, Clone)]
struct StoredBlob {
    content: String,
    version: VersionToken,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, StoredBlob>,
    gets: VecDeque<ReadScript>,
    puts: VecDeque<PutScript>,
    lists: VecDeque<ReadScript>,
    calls: Vec<RemoteCall>,
}

impl State {
    fn write(&mut self, path: &str, content: String) -> VersionToken {
        let version = fingerprint(&content);
        self.files.insert(
            path.to_string(),
            StoredBlob {
                content,
                version: version.clone(),
            },
        );
        version
    }
}

/// In-memory [`RemoteStore`] with the CAS semantics of a contents API
///
/// - versions are content fingerprints (sha256 of the stored content)
/// - `put` with `expected = None` only creates; an existing path conflicts
/// - directories exist only while they contain files
///
/// Failures and foreign writers can be scripted per operation kind; scripts
/// run in FIFO order.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    state: Mutex<State>,
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `document` as another client would, bypassing CAS
    pub fn seed_document(&self, path: &str, document: &RoadmapDocument) -> VersionToken {
        let text = document.to_json_pretty().unwrap();
        self.seed_text(path, &text)
    }

    /// Store raw document text, encoded for transport, bypassing CAS
    pub fn seed_text(&self, path: &str, text: &str) -> VersionToken {
        self.seed_raw(path, &codec::encode(text))
    }

    /// Store already-encoded content verbatim, bypassing CAS
    pub fn seed_raw(&self, path: &str, content: &str) -> VersionToken {
        self.state.lock().write(path, content.to_string())
    }

    pub fn remove(&self, path: &str) {
        self.state.lock().files.remove(path);
    }

    /// Fail the next `get` with `err`
    pub fn fail_next_get(&self, err: RemoteError) {
        self.state.lock().gets.push_back(ReadScript::Fail(err));
    }

    /// Fail the next `list` with `err`
    pub fn fail_next_list(&self, err: RemoteError) {
        self.state.lock().lists.push_back(ReadScript::Fail(err));
    }

    /// Fail the next `put` with `err`
    pub fn fail_next_put(&self, err: RemoteError) {
        self.state.lock().puts.push_back(PutScript::Fail(err));
    }

    /// Let the next `put` through untouched (used to reach later scripts)
    pub fn pass_next_put(&self) {
        self.state.lock().puts.push_back(PutScript::Proceed);
    }

    /// Have another client commit `document` to `path` right before the next `put`
    pub fn foreign_write_before_next_put(&self, path: &str, document: &RoadmapDocument) {
        let content = codec::encode(&document.to_json_pretty().unwrap());
        self.state.lock().puts.push_back(PutScript::ForeignWrite {
            path: path.to_string(),
            content,
        });
    }

    /// Raw stored content
    #[must_use]
    pub fn content(&self, path: &str) -> Option<String> {
        self.state.lock().files.get(path).map(|b| b.content.clone())
    }

    /// Stored content decoded to text
    #[must_use]
    pub fn text(&self, path: &str) -> Option<String> {
        self.content(path).map(|c| codec::decode(&c).unwrap())
    }

    /// Stored content parsed as a document
    #[must_use]
    pub fn document(&self, path: &str) -> Option<RoadmapDocument> {
        self.text(path).map(|t| RoadmapDocument::from_json(&t).unwrap())
    }

    #[must_use]
    pub fn version(&self, path: &str) -> Option<VersionToken> {
        self.state.lock().files.get(path).map(|b| b.version.clone())
    }

    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.state.lock().files.keys().cloned().collect()
    }

    /// Every call received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    #[must_use]
    pub fn put_count(&self) -> usize {
        self.count(|c| matches!(c, RemoteCall::Put { .. }))
    }

    #[must_use]
    pub fn get_count(&self) -> usize {
        self.count(|c| matches!(c, RemoteCall::Get { .. }))
    }

    fn count(&self, pred: impl Fn(&RemoteCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn get(&self, path: &str) -> Result<RemoteBlob, RemoteError> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::Get {
            path: path.to_string(),
        });
        if let Some(ReadScript::Fail(err)) = state.gets.pop_front() {
            return Err(err);
        }

        state
            .files
            .get(path)
            .map(|blob| RemoteBlob {
                content: blob.content.clone(),
                version: blob.version.clone(),
            })
            .ok_or_else(|| RemoteError::not_found(path))
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        expected: Option<&VersionToken>,
        _message: &str,
    ) -> Result<VersionToken, RemoteError> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::Put {
            path: path.to_string(),
            expected: expected.cloned(),
        });
        match state.puts.pop_front() {
            Some(PutScript::Fail(err)) => return Err(err),
            Some(PutScript::ForeignWrite {
                path: foreign_path,
                content: foreign_content,
            }) => {
                state.write(&foreign_path, foreign_content);
            }
            Some(PutScript::Proceed) | None => {}
        }

        let current = state.files.get(path).map(|b| &b.version);
        if current != expected {
            return Err(RemoteError::conflict(path));
        }
        Ok(state.write(path, content.to_string()))
    }

    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::List {
            dir: dir.to_string(),
        });
        if let Some(ReadScript::Fail(err)) = state.lists.pop_front() {
            return Err(err);
        }

        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir.trim_end_matches('/'))
        };
        let entries: Vec<RemoteEntry> = state
            .files
            .iter()
            .filter_map(|(path, blob)| {
                let name = path.strip_prefix(prefix.as_str())?;
                (!name.contains('/')).then(|| RemoteEntry {
                    name: name.to_string(),
                    path: path.clone(),
                    version: blob.version.clone(),
                })
            })
            .collect();

        let dir_exists = dir.is_empty() || state.files.keys().any(|p| p.starts_with(&prefix));
        if dir_exists {
            Ok(entries)
        } else {
            Err(RemoteError::not_found(dir))
        }
    }
}

/// Content fingerprint used as version token
#[must_use]
pub fn fingerprint(content: &str) -> VersionToken {
    VersionToken::new(hex::encode(Sha256::digest(content.as_bytes())))
}

/// A document with two projects, one PI and a custom theme
#[must_use]
pub fn sample_document() -> RoadmapDocument {
    RoadmapDocument::empty()
        .with_projects(vec![
            Project::new(json!({
                "id": "p-1",
                "name": "Checkout rewrite",
                "startDate": "2024-01-15",
                "endDate": "2024-04-30",
                "track": 0,
                "category": "Platform"
            })),
            Project::new(json!({
                "id": "p-2",
                "name": "Übersetzung 🌍",
                "startDate": "2024-03-01",
                "endDate": "2024-06-15",
                "track": 1
            })),
        ])
        .with_settings(
            Settings::default()
                .with_theme("ocean")
                .with_pis(vec![PlanningInterval::new("PI 24.1", "2024-01-08", "2024-03-15")]),
        )
}

/// [`sample_document`] with one more project named `name`
#[must_use]
pub fn document_with_project(name: &str) -> RoadmapDocument {
    let mut doc = sample_document();
    doc.projects.push(Project::new(json!({ "id": name, "name": name })));
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_requires_matching_version() {
        let remote = InMemoryRemote::new();
        let v1 = remote.put("a.json", "YQ==", None, "create").await.unwrap();

        let conflict = remote.put("a.json", "Yg==", None, "again").await.unwrap_err();
        assert!(conflict.is_conflict());

        let v2 = remote.put("a.json", "Yg==", Some(&v1), "update").await.unwrap();
        assert_ne!(v1, v2);
        assert!(remote.put("a.json", "Yw==", Some(&v1), "stale").await.is_err());
    }

    #[tokio::test]
    async fn list_only_direct_children() {
        let remote = InMemoryRemote::new();
        remote.seed_raw("snapshots/a.json", "YQ==");
        remote.seed_raw("snapshots/deep/b.json", "Yg==");
        remote.seed_raw("roadmap.json", "Yw==");

        let entries = remote.list("snapshots").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.json");
        assert!(remote.list("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn scripted_failures_are_fifo() {
        let remote = InMemoryRemote::new();
        remote.seed_raw("a", "YQ==");
        remote.fail_next_get(RemoteError::unavailable("first"));

        assert!(remote.get("a").await.is_err());
        assert!(remote.get("a").await.is_ok());
        assert_eq!(remote.get_count(), 2);
    }

    #[test]
    fn fingerprint_is_content_addressed() {
        assert_eq!(fingerprint("x"), fingerprint("x"));
        assert_ne!(fingerprint("x"), fingerprint("y"));
        assert_eq!(fingerprint("x").as_str().len(), 64);
    }
}
