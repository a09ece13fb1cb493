//! User settings and their default table
//!
//! Stored documents may carry partial settings (older clients wrote none at
//! all). [`reconcile_settings`] fills every missing key from the defaults:
//!
//! | key          | default                                   |
//! |--------------|-------------------------------------------|
//! | `theme`      | [`DEFAULT_THEME`] (`"vibrant"`)           |
//! | `categories` | [`DEFAULT_CATEGORIES`] (8 entries, in order) |
//! | `pis`        | empty                                     |
//!
//! A key present in the stored document always wins; `null` counts as missing.
//! Keys this crate does not know are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default colour theme
pub const DEFAULT_THEME: &str = "vibrant";

/// Default project categories, in display order
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "Strategic",
    "Platform",
    "Feature",
    "Infrastructure",
    "Security",
    "Compliance",
    "Research",
    "Maintenance",
];

/// A planning interval (PI) on the roadmap timeline
///
/// Kept as the raw stored value, like [`crate::Project`]: clients disagree on
/// which keys a PI carries, so a partial or oddly typed entry must never make
/// the document unreadable. Accessors read the common keys leniently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanningInterval(pub Value);

impl PlanningInterval {
    /// Create a planning interval with the common keys
    #[must_use]
    pub fn new(name: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::String(name.into()));
        fields.insert("start".to_string(), Value::String(start.into()));
        fields.insert("end".to_string(), Value::String(end.into()));
        Self(Value::Object(fields))
    }

    /// Display label, e.g. `PI 24.1`
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// ISO date the interval starts
    #[must_use]
    pub fn start(&self) -> Option<&str> {
        self.str_field("start")
    }

    /// ISO date the interval ends
    #[must_use]
    pub fn end(&self) -> Option<&str> {
        self.str_field("end")
    }

    /// Borrow the raw value
    #[inline]
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl From<Value> for PlanningInterval {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Complete user settings
///
/// # Invariants
/// - Every field is populated after a document is loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Colour theme name
    pub theme: String,
    /// Ordered category labels
    pub categories: Vec<String>,
    /// Planning intervals
    pub pis: Vec<PlanningInterval>,
    /// Keys written by other clients
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| (*c).to_string()).collect(),
            pis: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// With theme
    #[inline]
    #[must_use]
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// With planning intervals
    #[inline]
    #[must_use]
    pub fn with_pis(mut self, pis: Vec<PlanningInterval>) -> Self {
        self.pis = pis;
        self
    }
}

/// Settings as stored on the remote, every key optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSettings {
    /// Stored theme; `None` if absent or `null`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Stored categories; an empty list is a value, not a gap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Stored planning intervals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pis: Option<Vec<PlanningInterval>>,
    /// Keys written by other clients
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Settings> for PartialSettings {
    fn from(settings: Settings) -> Self {
        Self {
            theme: Some(settings.theme),
            categories: Some(settings.categories),
            pis: Some(settings.pis),
            extra: settings.extra,
        }
    }
}

/// Reconcile stored settings with a default table, field by field
///
/// Stored values take precedence; defaults fill only missing keys. Extra
/// keys from both sides are kept, stored ones winning on collision.
#[must_use]
pub fn reconcile_settings(stored: PartialSettings, defaults: Settings) -> Settings {
    let mut extra = defaults.extra;
    extra.extend(stored.extra);

    Settings {
        theme: stored.theme.unwrap_or(defaults.theme),
        categories: stored.categories.unwrap_or(defaults.categories),
        pis: stored.pis.unwrap_or(defaults.pis),
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn default_table() {
        let settings = Settings::default();
        assert_eq!(settings.theme, "vibrant");
        assert_eq!(settings.categories.len(), 8);
        assert_eq!(settings.categories[0], "Strategic");
        assert!(settings.pis.is_empty());
        assert!(settings.extra.is_empty());
    }

    #[test]
    fn empty_stored_settings_yield_defaults() {
        let merged = reconcile_settings(PartialSettings::default(), Settings::default());
        assert_eq!(merged, Settings::default());
    }

    #[test]
    fn stored_theme_wins_and_rest_defaults() {
        let stored: PartialSettings = serde_json::from_value(json!({ "theme": "dark" })).unwrap();
        let merged = reconcile_settings(stored, Settings::default());

        assert_eq!(merged.theme, "dark");
        assert_eq!(merged.categories, Settings::default().categories);
        assert!(merged.pis.is_empty());
    }

    #[test]
    fn null_counts_as_missing() {
        let stored: PartialSettings =
            serde_json::from_value(json!({ "theme": null, "categories": ["Only"] })).unwrap();
        let merged = reconcile_settings(stored, Settings::default());

        assert_eq!(merged.theme, DEFAULT_THEME);
        assert_eq!(merged.categories, vec!["Only".to_string()]);
    }

    #[test]
    fn empty_list_is_a_value_not_a_gap() {
        let stored: PartialSettings = serde_json::from_value(json!({ "categories": [] })).unwrap();
        let merged = reconcile_settings(stored, Settings::default());
        assert!(merged.categories.is_empty());
    }

    #[test]
    fn unknown_keys_survive() {
        let stored: PartialSettings =
            serde_json::from_value(json!({ "zoom": 3, "theme": "mono" })).unwrap();
        let merged = reconcile_settings(stored, Settings::default());

        assert_eq!(merged.extra.get("zoom"), Some(&json!(3)));
        let out = serde_json::to_value(&merged).unwrap();
        assert_eq!(out["zoom"], json!(3));
        assert_eq!(out["theme"], json!("mono"));
    }

    #[test]
    fn planning_interval_shape() {
        let pi: PlanningInterval = serde_json::from_value(json!({
            "name": "PI 24.1",
            "start": "2024-01-08",
            "end": "2024-03-15",
            "color": "#ff0"
        }))
        .unwrap();

        assert_eq!(pi.name(), Some("PI 24.1"));
        assert_eq!(pi.end(), Some("2024-03-15"));
        assert_eq!(pi.as_value()["color"], json!("#ff0"));
    }

    #[test]
    fn partial_planning_intervals_are_kept_verbatim() {
        let stored: PartialSettings = serde_json::from_value(json!({
            "pis": [
                { "name": "PI 1", "start": "2024-01-01" },
                { "name": 7, "end": null },
                {}
            ]
        }))
        .unwrap();
        let merged = reconcile_settings(stored, Settings::default());

        assert_eq!(merged.pis.len(), 3);
        assert_eq!(merged.pis[0].start(), Some("2024-01-01"));
        assert_eq!(merged.pis[0].end(), None);
        assert_eq!(merged.pis[1].name(), None);
        assert_eq!(merged.pis[1].as_value(), &json!({ "name": 7, "end": null }));
    }

    proptest! {
        #[test]
        fn prop_stored_keys_take_precedence(
            theme in proptest::option::of("[a-z]{1,12}"),
            categories in proptest::option::of(proptest::collection::vec("[A-Za-z ]{1,10}", 0..6)),
        ) {
            let stored = PartialSettings {
                theme: theme.clone(),
                categories: categories.clone(),
                pis: None,
                extra: Map::new(),
            };
            let defaults = Settings::default();
            let merged = reconcile_settings(stored, defaults.clone());

            prop_assert_eq!(merged.theme, theme.unwrap_or(defaults.theme));
            prop_assert_eq!(merged.categories, categories.unwrap_or(defaults.categories));
            prop_assert!(merged.pis.is_empty());
        }
    }
}
