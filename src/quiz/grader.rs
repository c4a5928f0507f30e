// src/quiz/grader.rs
//! LLM judgment of a student's free-text example.

use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::{OakError, Result};
use crate::llm::{self, extract_json_object, LlmProvider};
use crate::session::ConceptQuestion;

const GRADER_SYSTEM: &str = "You are Sage, a warm but honest tutor checking a student's example \
of a concept. Respond with strict JSON only, no Markdown.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub is_correct: bool,
    pub feedback: String,
    pub hint: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGrade {
    is_correct: bool,
    feedback: String,
    #[serde(default)]
    hint: Option<String>,
}

#[derive(Clone)]
pub struct ExampleGrader {
    provider: Arc<dyn LlmProvider>,
}

impl ExampleGrader {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn grade(&self, question: &ConceptQuestion, answer: &str) -> Result<Grade> {
        let prompt = format!(
            "Concept: {concept}\n\
             Description: {description}\n\
             The student was asked: {example_prompt}\n\
             Hint they were given: {example_hint}\n\n\
             Student's example:\n\"\"\"\n{answer}\n\"\"\"\n\n\
             Decide whether the example correctly illustrates the concept. Be generous with \
             informal wording but reject examples that show a different idea.\n\
             Return JSON of the form {{\"isCorrect\": boolean, \"feedback\": string, \
             \"hint\": string}}. feedback speaks directly to the student in one or two sentences; \
             hint is only needed when the example is not correct.",
            concept = question.concept,
            description = question.concept_description,
            example_prompt = question.example_prompt,
            example_hint = question.example_hint,
        );

        let text = llm::generate(self.provider.as_ref(), &prompt, GRADER_SYSTEM)
            .await
            .map_err(|e| OakError::Llm(e.to_string()))?;

        let grade = parse_grade(&text)?;
        debug!("Graded example for '{}': correct={}", question.concept, grade.is_correct);
        Ok(grade)
    }
}

pub(crate) fn parse_grade(text: &str) -> Result<Grade> {
    let value = extract_json_object(text)
        .map_err(|e| OakError::GenerationFailed(format!("grading output is not JSON: {e}")))?;
    let raw: RawGrade = serde_json::from_value(value)
        .map_err(|e| OakError::GenerationFailed(format!("grading output is malformed: {e}")))?;

    Ok(Grade {
        is_correct: raw.is_correct,
        feedback: raw.feedback.trim().to_string(),
        hint: raw
            .hint
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fenced_grade() {
        let grade = parse_grade("```json\n{\"isCorrect\": false, \"feedback\": \"Close!\", \"hint\": \"Think sunlight\"}\n```").unwrap();
        assert!(!grade.is_correct);
        assert_eq!(grade.hint.as_deref(), Some("Think sunlight"));
    }

    #[test]
    fn blank_hint_is_dropped() {
        let grade = parse_grade(r#"{"isCorrect": true, "feedback": "Great", "hint": ""}"#).unwrap();
        assert!(grade.is_correct);
        assert_eq!(grade.hint, None);
    }

    #[test]
    fn missing_verdict_is_generation_failure() {
        let err = parse_grade(r#"{"feedback": "Great"}"#).unwrap_err();
        assert!(matches!(err, OakError::GenerationFailed(_)));
        let err = parse_grade("yes").unwrap_err();
        assert!(matches!(err, OakError::GenerationFailed(_)));
    }
}
