// src/lesson/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One concept students must be quizzed on. Teachers (and the summarizer)
/// sometimes supply bare strings; those deserialize with an empty description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawKeyConcept")]
pub struct KeyConcept {
    pub concept: String,
    pub description: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKeyConcept {
    Bare(String),
    Full {
        concept: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl From<RawKeyConcept> for KeyConcept {
    fn from(raw: RawKeyConcept) -> Self {
        match raw {
            RawKeyConcept::Bare(concept) => KeyConcept {
                concept,
                description: String::new(),
            },
            RawKeyConcept::Full {
                concept,
                description,
            } => KeyConcept {
                concept,
                description: description.unwrap_or_default(),
            },
        }
    }
}

impl KeyConcept {
    pub fn new(concept: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub course_id: String,
    pub week_number: i64,
    pub lesson_number: i64,
    pub topic: String,
    pub ai_summary: Option<String>,
    pub key_concepts: Option<Vec<KeyConcept>>,
    pub pre_class_reading: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Lesson {
    /// Key concepts, or an empty slice when none were set.
    pub fn concepts(&self) -> &[KeyConcept] {
        self.key_concepts.as_deref().unwrap_or(&[])
    }

    /// A quiz session can only start once the lesson has key concepts.
    pub fn is_chat_ready(&self) -> bool {
        !self.concepts().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    pub course_id: Option<String>,
    pub week_number: Option<i64>,
    pub lesson_number: Option<i64>,
    pub topic: Option<String>,
    pub key_concepts: Option<Vec<KeyConcept>>,
    pub pre_class_reading: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonRequest {
    pub week_number: Option<i64>,
    pub lesson_number: Option<i64>,
    pub topic: Option<String>,
    pub ai_summary: Option<String>,
    pub key_concepts: Option<Vec<KeyConcept>>,
    pub pre_class_reading: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_string_concepts_are_normalized() {
        let concepts: Vec<KeyConcept> = serde_json::from_str(
            r#"["Photosynthesis", {"concept": "Respiration", "description": "Releasing energy"}, {"concept": "Osmosis"}]"#,
        )
        .unwrap();

        assert_eq!(concepts[0], KeyConcept::new("Photosynthesis", ""));
        assert_eq!(concepts[1], KeyConcept::new("Respiration", "Releasing energy"));
        assert_eq!(concepts[2], KeyConcept::new("Osmosis", ""));
    }

    #[test]
    fn concepts_serialize_as_objects() {
        let json = serde_json::to_value(KeyConcept::new("Osmosis", "")).unwrap();
        assert_eq!(json["concept"], "Osmosis");
        assert_eq!(json["description"], "");
    }
}
