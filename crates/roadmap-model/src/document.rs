//! The roadmap document
//!
//! [`RoadmapDocument`] deserializes through [`StoredDocument`], the lenient
//! on-disk shape, so a parsed document always carries complete settings.

use crate::settings::{reconcile_settings, PartialSettings, Settings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current document schema version
pub const SCHEMA_VERSION: u32 = 2;

fn schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A project record
///
/// Opaque to the sync layer: id, name, dates, track and anything else a
/// client stores are kept exactly as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Project(pub Value);

impl Project {
    /// Wrap a raw project value
    #[inline]
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the raw value
    #[inline]
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Project {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Schema version (not the sync version)
    #[serde(default = "schema_version")]
    pub version: u32,
    /// Metadata keys written by other clients
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            extra: Map::new(),
        }
    }
}

/// The roadmap: projects plus user settings
///
/// # Invariants
/// - `settings` is complete; missing stored keys are filled from defaults
/// - top-level keys written by other clients are preserved in `extra`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredDocument")]
pub struct RoadmapDocument {
    /// Project records, in stored order
    pub projects: Vec<Project>,
    /// Schema metadata
    pub meta: DocumentMeta,
    /// Complete user settings
    pub settings: Settings,
    /// Top-level keys written by other clients
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoadmapDocument {
    /// The "no document yet" state: no projects, current schema, default settings
    #[must_use]
    pub fn empty() -> Self {
        Self {
            projects: Vec::new(),
            meta: DocumentMeta::default(),
            settings: Settings::default(),
            extra: Map::new(),
        }
    }

    /// With projects
    #[inline]
    #[must_use]
    pub fn with_projects(mut self, projects: Vec<Project>) -> Self {
        self.projects = projects;
        self
    }

    /// With settings
    #[inline]
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Parse a stored document, reconciling its settings with the defaults
    ///
    /// # Errors
    /// Returns [`ModelError::Parse`] if the text is not a valid document
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(ModelError::Parse)
    }

    /// Serialize with stable 2-space indentation
    ///
    /// # Errors
    /// Returns [`ModelError::Serialize`] if a value cannot be represented as JSON
    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(ModelError::Serialize)
    }
}

impl Default for RoadmapDocument {
    fn default() -> Self {
        Self::empty()
    }
}

/// Lenient stored shape; every section may be absent or `null`
#[derive(Debug, Deserialize)]
struct StoredDocument {
    #[serde(default)]
    projects: Option<Vec<Project>>,
    #[serde(default)]
    meta: Option<DocumentMeta>,
    #[serde(default)]
    settings: Option<PartialSettings>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<StoredDocument> for RoadmapDocument {
    fn from(stored: StoredDocument) -> Self {
        Self {
            projects: stored.projects.unwrap_or_default(),
            meta: stored.meta.unwrap_or_default(),
            settings: reconcile_settings(stored.settings.unwrap_or_default(), Settings::default()),
            extra: stored.extra,
        }
    }
}

/// Errors raised while reading or writing documents
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Stored text is not a valid roadmap document
    #[error("invalid roadmap document: {0}")]
    Parse(#[source] serde_json::Error),

    /// Document could not be serialized
    #[error("cannot serialize roadmap document: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PlanningInterval;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn field_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(|f| json!(f)),
            (0.0..100.0f64).prop_map(|f| json!(f)),
            any::<i64>().prop_map(|i| json!(i)),
            any::<bool>().prop_map(|b| json!(b)),
            "[a-zA-Z0-9 ]{0,12}".prop_map(|s| json!(s)),
        ]
    }

    fn project() -> impl Strategy<Value = Project> {
        proptest::collection::btree_map("[a-zA-Z]{1,10}", field_value(), 0..6)
            .prop_map(|fields| Project::new(Value::Object(fields.into_iter().collect())))
    }

    #[test]
    fn empty_document_shape() {
        let doc = RoadmapDocument::empty();
        assert!(doc.projects.is_empty());
        assert_eq!(doc.meta.version, 2);
        assert_eq!(doc.settings, Settings::default());
    }

    #[test]
    fn legacy_document_without_settings() {
        let doc = RoadmapDocument::from_json(r#"{"projects":[],"meta":{"version":1}}"#).unwrap();
        assert_eq!(doc.meta.version, 1);
        assert_eq!(doc.settings, Settings::default());
    }

    #[test]
    fn missing_sections_default() {
        let doc = RoadmapDocument::from_json("{}").unwrap();
        assert_eq!(doc, RoadmapDocument::empty());

        let doc = RoadmapDocument::from_json(r#"{"projects":null,"settings":null}"#).unwrap();
        assert_eq!(doc, RoadmapDocument::empty());
    }

    #[test]
    fn projects_are_opaque() {
        let project = json!({
            "id": 17,
            "name": "Ledger ✓",
            "startDate": "2024-02-01",
            "endDate": "2024-05-30",
            "nested": { "anything": [1, 2, 3] }
        });
        let raw = json!({ "projects": [project.clone()] }).to_string();

        let doc = RoadmapDocument::from_json(&raw).unwrap();
        assert_eq!(doc.projects[0].as_value(), &project);
    }

    #[test]
    fn unknown_top_level_keys_round_trip() {
        let raw = json!({ "projects": [], "owner": "team-a", "meta": { "version": 2, "note": "x" } })
            .to_string();
        let doc = RoadmapDocument::from_json(&raw).unwrap();
        assert_eq!(doc.extra.get("owner"), Some(&json!("team-a")));
        assert_eq!(doc.meta.extra.get("note"), Some(&json!("x")));

        let again = RoadmapDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn pretty_output_uses_two_space_indent() {
        let doc = RoadmapDocument::empty();
        let pretty = doc.to_json_pretty().unwrap();
        assert!(pretty.starts_with("{\n  \"projects\": []"));
        assert!(pretty.contains("\n  \"settings\": {\n    \"theme\": \"vibrant\""));
    }

    #[test]
    fn full_document_round_trip() {
        let doc = RoadmapDocument::empty()
            .with_projects(vec![Project::new(json!({ "id": "a", "track": 1 }))])
            .with_settings(
                Settings::default()
                    .with_theme("dark")
                    .with_pis(vec![PlanningInterval::new("PI 1", "2024-01-01", "2024-03-31")]),
            );

        let parsed = RoadmapDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn floats_survive_text_round_trip() {
        let doc = RoadmapDocument::empty()
            .with_projects(vec![Project::new(json!({ "progress": 11.290_774_160_688_077 }))]);

        let parsed = RoadmapDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed.projects[0].as_value()["progress"], json!(11.290_774_160_688_077));
    }

    #[test]
    fn stored_key_order_is_kept() {
        let text = r#"{
  "projects": [
    {
      "id": "p-1",
      "name": "Checkout",
      "startDate": "2024-01-15",
      "endDate": "2024-04-30",
      "track": 0
    }
  ],
  "meta": {
    "version": 2
  },
  "settings": {
    "theme": "vibrant",
    "categories": [
      "Strategic"
    ],
    "pis": [
      {
        "name": "PI 1",
        "start": "2024-01-01"
      }
    ],
    "zoom": 3
  },
  "owner": "team-a"
}"#;

        let doc = RoadmapDocument::from_json(text).unwrap();
        assert_eq!(doc.to_json_pretty().unwrap(), text);
    }

    #[test]
    fn malformed_text_is_parse_error() {
        let err = RoadmapDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
        assert!(err.to_string().contains("invalid roadmap document"));
    }

    #[test]
    fn wrong_shape_is_parse_error() {
        let err = RoadmapDocument::from_json(r#"{"projects": 5}"#).unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    proptest! {
        #[test]
        fn prop_projects_round_trip_through_text(projects in proptest::collection::vec(project(), 0..4)) {
            let doc = RoadmapDocument::empty().with_projects(projects);
            let parsed = RoadmapDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
            prop_assert_eq!(parsed, doc);
        }
    }
}
