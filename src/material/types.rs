// src/material/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lesson::KeyConcept;

/// An uploaded teaching document and what was extracted from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub lesson_id: String,
    pub title: String,
    /// Name of the stored file inside the storage directory
    pub file_name: String,
    pub mime_type: String,
    pub content_text: Option<String>,
    pub summary: Option<String>,
    pub key_concepts: Option<Vec<KeyConcept>>,
    pub created_at: DateTime<Utc>,
}

/// Result of an LLM summarization. `degraded` marks placeholder output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOutcome {
    pub summary: String,
    pub key_concepts: Vec<KeyConcept>,
    pub degraded: bool,
}
