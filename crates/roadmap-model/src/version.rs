//! Remote version tokens
//!
//! Provides [`VersionToken`], the opaque content fingerprint a remote store
//! issues for a blob. The token is the compare-and-swap anchor for writes.

use std::fmt::{self, Display, Formatter};

/// Opaque fingerprint of a remote blob's exact content
///
/// Issued by the remote store, never computed or interpreted locally.
/// Two tokens are equal iff they denote the same remote content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wrap a token string issued by a remote store
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw token
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Short form for logs (first 7 chars, git style)
    #[must_use]
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(7) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl Display for VersionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VersionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for VersionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for VersionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
