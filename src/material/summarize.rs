// src/material/summarize.rs
//! LLM summaries for materials and lessons.
//!
//! Failures here never block the teacher: a provider error or unreadable
//! output degrades to placeholder text and the outcome is flagged `degraded`.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::types::{Material, SummaryOutcome};
use crate::lesson::{KeyConcept, Lesson};
use crate::llm::{self, extract_json_object, LlmProvider};

pub const SUMMARY_PLACEHOLDER: &str = "Summary unavailable. Please try again later.";

/// Material text beyond this many characters is not sent to the model.
const MAX_MATERIAL_CHARS: usize = 12_000;

const SUMMARY_SYSTEM: &str = "You are an assistant that helps teachers prepare lessons. \
Respond with strict JSON only, no Markdown.";

#[derive(Clone)]
pub struct MaterialSummarizer {
    provider: Arc<dyn LlmProvider>,
}

impl MaterialSummarizer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn summarize_material(&self, material: &Material) -> SummaryOutcome {
        let text = material.content_text.as_deref().unwrap_or("");
        let prompt = format!(
            "Summarize the following teaching material titled \"{}\" for a teacher.\n\
             Return JSON of the form {{\"summary\": string, \"keyConcepts\": \
             [{{\"concept\": string, \"description\": string}}]}} with 3 to 8 key concepts.\n\n\
             Material:\n{}",
            material.title,
            truncate_chars(text, MAX_MATERIAL_CHARS)
        );

        match self.request_summary(&prompt).await {
            Some((summary, key_concepts)) => {
                info!("Summarized material {} ({} concepts)", material.id, key_concepts.len());
                SummaryOutcome {
                    summary,
                    key_concepts,
                    degraded: false,
                }
            }
            None => SummaryOutcome {
                summary: SUMMARY_PLACEHOLDER.to_string(),
                key_concepts: Vec::new(),
                degraded: true,
            },
        }
    }

    /// Lesson summary from its materials. Key concepts are the merged material
    /// concepts; the model only writes the prose summary.
    pub async fn summarize_lesson(&self, lesson: &Lesson, materials: &[Material]) -> SummaryOutcome {
        let key_concepts = merge_concepts(
            materials
                .iter()
                .filter_map(|m| m.key_concepts.as_deref()),
        );

        let mut context = String::new();
        for material in materials {
            let body = match material.summary.as_deref() {
                Some(summary) => summary.to_string(),
                None => truncate_chars(material.content_text.as_deref().unwrap_or(""), 2_000),
            };
            context.push_str(&format!("## {}\n{}\n\n", material.title, body));
        }

        let prompt = format!(
            "Write a short summary of the lesson \"{}\" from the material summaries below.\n\
             Return JSON of the form {{\"summary\": string, \"keyConcepts\": []}}.\n\n{}",
            lesson.topic, context
        );

        match self.request_summary(&prompt).await {
            Some((summary, _)) => SummaryOutcome {
                summary,
                key_concepts,
                degraded: false,
            },
            None => SummaryOutcome {
                summary: SUMMARY_PLACEHOLDER.to_string(),
                key_concepts,
                degraded: true,
            },
        }
    }

    async fn request_summary(&self, prompt: &str) -> Option<(String, Vec<KeyConcept>)> {
        let text = match llm::generate(self.provider.as_ref(), prompt, SUMMARY_SYSTEM).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Summary generation failed, using placeholder: {}", e);
                return None;
            }
        };

        let parsed = parse_summary(&text);
        if parsed.is_none() {
            warn!("Summary output was not valid JSON, using placeholder");
        }
        parsed
    }
}

fn parse_summary(text: &str) -> Option<(String, Vec<KeyConcept>)> {
    let value = extract_json_object(text).ok()?;
    let summary = value.get("summary")?.as_str()?.trim().to_string();
    if summary.is_empty() {
        return None;
    }
    let key_concepts = value
        .get("keyConcepts")
        .or_else(|| value.get("key_concepts"))
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<KeyConcept>>(v).ok())
        .unwrap_or_default();
    Some((summary, key_concepts))
}

/// Concatenate concept lists, keeping the first occurrence of each concept
/// name (case-insensitive).
pub fn merge_concepts<'a, I>(lists: I) -> Vec<KeyConcept>
where
    I: IntoIterator<Item = &'a [KeyConcept]>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for list in lists {
        for concept in list {
            if seen.insert(concept.concept.trim().to_lowercase()) {
                merged.push(concept.clone());
            }
        }
    }
    merged
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
