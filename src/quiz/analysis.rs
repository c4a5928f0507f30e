// src/quiz/analysis.rs
//! End-of-session analysis for the free-form chat flow. Degrades to a
//! neutral report instead of failing.

use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::lesson::KeyConcept;
use crate::llm::{self, extract_json_object, LlmProvider};
use crate::session::AnalysisReport;

const ANALYST_SYSTEM: &str = "You are an education specialist reviewing a tutoring conversation. \
Respond with strict JSON only, no Markdown.";

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
struct RawReport {
    understanding_level: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    misunderstandings: Vec<String>,
    #[serde(default)]
    summary: String,
}

#[derive(Clone)]
pub struct SessionAnalyst {
    provider: Arc<dyn LlmProvider>,
}

impl SessionAnalyst {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn analyze(&self, concepts: &[KeyConcept], transcript: &str) -> AnalysisReport {
        let concept_names: Vec<&str> = concepts.iter().map(|c| c.concept.as_str()).collect();
        let prompt = format!(
            "Key concepts of the lesson: {}\n\n\
             Conversation between the tutor and the student:\n{}\n\n\
             Judge how well the student understands the key concepts.\n\
             Return JSON of the form {{\"understanding_level\": number 0-100, \
             \"strengths\": [string], \"misunderstandings\": [string], \"summary\": string}}.",
            concept_names.join(", "),
            transcript
        );

        match llm::generate(self.provider.as_ref(), &prompt, ANALYST_SYSTEM).await {
            Ok(text) => parse_report(&text).unwrap_or_else(|| {
                warn!("Session analysis was unreadable, using neutral report");
                AnalysisReport::neutral()
            }),
            Err(e) => {
                warn!("Session analysis failed, using neutral report: {}", e);
                AnalysisReport::neutral()
            }
        }
    }
}

pub(crate) fn parse_report(text: &str) -> Option<AnalysisReport> {
    let value = extract_json_object(text).ok()?;
    let raw: RawReport = serde_json::from_value(value).ok()?;
    Some(AnalysisReport {
        understanding_level: raw.understanding_level.round().clamp(0.0, 100.0) as u8,
        strengths: raw.strengths,
        misunderstandings: raw.misunderstandings,
        summary: raw.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_level() {
        let report = parse_report(r#"{"understanding_level": 140, "summary": "ok"}"#).unwrap();
        assert_eq!(report.understanding_level, 100);
        assert!(report.strengths.is_empty());
    }

    #[test]
    fn unreadable_report_is_none() {
        assert!(parse_report("The student did fine.").is_none());
        assert!(parse_report(r#"{"summary": "no level"}"#).is_none());
    }
}
