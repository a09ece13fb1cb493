//! Roadmap Document Model
//!
//! The data shapes shared by every client of the roadmap blob.
//!
//! # Core Concepts
//!
//! - [`RoadmapDocument`]: projects, schema metadata and settings
//! - [`Project`]: opaque project record, never inspected by the sync layer
//! - [`Settings`]: theme, categories and planning intervals, always complete
//! - [`reconcile_settings`]: field-by-field merge of stored settings over the default table
//! - [`VersionToken`]: opaque fingerprint issued by the remote store
//!
//! # Example
//!
//! ```rust,ignore
//! use roadmap_model::RoadmapDocument;
//!
//! let doc = RoadmapDocument::from_json(r#"{"projects":[],"settings":{"theme":"dark"}}"#)?;
//! assert_eq!(doc.settings.theme, "dark");
//! assert_eq!(doc.settings.categories.len(), 8);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod document;
mod settings;
mod version;

// Re-exports
pub use document::{DocumentMeta, ModelError, Project, RoadmapDocument, SCHEMA_VERSION};
pub use settings::{
    reconcile_settings, PartialSettings, PlanningInterval, Settings, DEFAULT_CATEGORIES,
    DEFAULT_THEME,
};
pub use version::VersionToken;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
