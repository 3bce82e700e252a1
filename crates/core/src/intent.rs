//! Structured classification of a user turn.
//!
//! The classifier model is asked to emit exactly this JSON shape. Every field
//! is defaulted on deserialization so a partially-filled object from the model
//! still yields a well-formed [`Intent`].

use serde::{Deserialize, Deserializer, Serialize};

/// Intent label used when classification fails.
pub const GENERAL_QUESTION: &str = "general_question";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Category label, e.g. `chemical_lookup`, `chemical_followup`, `weather`.
    #[serde(default = "general_question")]
    pub intent: String,

    #[serde(default)]
    pub targets: Targets,

    #[serde(default)]
    pub needs: Needs,

    #[serde(default)]
    pub query: String,
}

fn general_question() -> String {
    GENERAL_QUESTION.into()
}

/// Entities the user named. Blank strings from the model count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    #[serde(default, deserialize_with = "non_blank")]
    pub crop: Option<String>,

    #[serde(rename = "pestOrDisease", default, deserialize_with = "non_blank")]
    pub pest_or_disease: Option<String>,

    #[serde(default, deserialize_with = "non_blank")]
    pub chemical: Option<String>,
}

impl Targets {
    pub fn is_empty(&self) -> bool {
        self.crop.is_none() && self.pest_or_disease.is_none() && self.chemical.is_none()
    }
}

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null")))
}

/// Which data sources the turn requires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Needs {
    #[serde(default)]
    pub image: bool,
    #[serde(default)]
    pub weather: bool,
    #[serde(default)]
    pub vector_search: bool,
    #[serde(default)]
    pub db_crop: bool,
    #[serde(default)]
    pub db_pest: bool,
    #[serde(default)]
    pub db_chemical: bool,
    #[serde(default)]
    pub memory: bool,
}

impl Needs {
    pub fn any(&self) -> bool {
        self.image
            || self.weather
            || self.vector_search
            || self.db_crop
            || self.db_pest
            || self.db_chemical
            || self.memory
    }

    /// Either of the two product lookups.
    pub fn chemical(&self) -> bool {
        self.db_chemical || self.vector_search
    }
}

impl Intent {
    /// The safe default: a general question with no data needs.
    pub fn fallback(query: impl Into<String>) -> Self {
        Self {
            intent: general_question(),
            targets: Targets::default(),
            needs: Needs::default(),
            query: query.into(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.intent == GENERAL_QUESTION && !self.needs.any() && self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_has_no_needs_or_targets() {
        let intent = Intent::fallback("hello");
        assert_eq!(intent.intent, GENERAL_QUESTION);
        assert!(!intent.needs.any());
        assert!(intent.targets.is_empty());
        assert_eq!(intent.query, "hello");
        assert!(intent.is_fallback());
    }

    #[test]
    fn parses_model_output() {
        let json = r#"{
            "intent": "chemical_lookup",
            "targets": {"crop": "maize", "pestOrDisease": "aphids", "chemical": null},
            "needs": {"vector_search": true, "db_chemical": true, "db_crop": true},
            "query": "what can I use for aphids on my maize?"
        }"#;
        let intent: Intent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.intent, "chemical_lookup");
        assert_eq!(intent.targets.crop.as_deref(), Some("maize"));
        assert_eq!(intent.targets.pest_or_disease.as_deref(), Some("aphids"));
        assert!(intent.targets.chemical.is_none());
        assert!(intent.needs.chemical());
        assert!(!intent.needs.weather);
    }

    #[test]
    fn blank_targets_are_absent() {
        let json = r#"{"intent": "x", "targets": {"crop": "  ", "chemical": "null"}}"#;
        let intent: Intent = serde_json::from_str(json).unwrap();
        assert!(intent.targets.is_empty());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let intent: Intent = serde_json::from_str("{}").unwrap();
        assert_eq!(intent.intent, GENERAL_QUESTION);
        assert!(!intent.needs.any());
    }
}
