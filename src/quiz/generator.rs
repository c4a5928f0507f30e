// src/quiz/generator.rs
//! Builds one multiple-choice-then-example question per lesson concept.
//!
//! Unlike material summaries there is no fallback here: a provider failure
//! or unusable output fails the request with `GenerationFailed`.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{OakError, Result};
use crate::lesson::{KeyConcept, Lesson};
use crate::llm::{self, extract_json_object, LlmProvider};
use crate::material::summarize::truncate_chars;
use crate::material::Material;
use crate::session::{AnswerOptions, ConceptQuestion, OptionKey};

const MATERIAL_CONTEXT_CHARS: usize = 3_000;

const GENERATOR_SYSTEM: &str = "You are Sage, a friendly study companion who writes short \
quizzes for students. Respond with strict JSON only, no Markdown.";

#[derive(Clone)]
pub struct QuestionSetGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl QuestionSetGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate(&self, lesson: &Lesson, materials: &[Material]) -> Result<Vec<ConceptQuestion>> {
        let concepts = lesson.concepts();
        if concepts.is_empty() {
            return Err(OakError::LessonNotReady);
        }

        let prompt = build_prompt(lesson, concepts, &material_context(materials));
        debug!("Generating {} questions for lesson {}", concepts.len(), lesson.id);

        let text = llm::generate(self.provider.as_ref(), &prompt, GENERATOR_SYSTEM)
            .await
            .map_err(|e| OakError::GenerationFailed(format!("question set request failed: {e}")))?;

        let questions = parse_questions(&text, concepts)?;
        info!("Generated {} questions for lesson {}", questions.len(), lesson.id);
        Ok(questions)
    }
}

fn material_context(materials: &[Material]) -> String {
    let mut context = String::new();
    for material in materials {
        context.push_str(&format!("### {}\n", material.title));
        match material.summary.as_deref() {
            Some(summary) => context.push_str(summary),
            None => context.push_str(&truncate_chars(
                material.content_text.as_deref().unwrap_or(""),
                MATERIAL_CONTEXT_CHARS,
            )),
        }
        if let Some(concepts) = material.key_concepts.as_deref().filter(|c| !c.is_empty()) {
            let names: Vec<&str> = concepts.iter().map(|c| c.concept.as_str()).collect();
            context.push_str(&format!("\nKey concepts: {}", names.join(", ")));
        }
        context.push_str("\n\n");
    }
    context
}

pub(crate) fn build_prompt(lesson: &Lesson, concepts: &[KeyConcept], context: &str) -> String {
    let mut concept_list = String::new();
    for (i, concept) in concepts.iter().enumerate() {
        if concept.description.is_empty() {
            concept_list.push_str(&format!("{}. {}\n", i + 1, concept.concept));
        } else {
            concept_list.push_str(&format!(
                "{}. {}: {}\n",
                i + 1,
                concept.concept,
                concept.description
            ));
        }
    }

    let mut prompt = format!(
        "Create a quiz for the lesson \"{topic}\".\n\n\
         Concepts, in order:\n{concept_list}\n",
        topic = lesson.topic,
    );
    if let Some(summary) = lesson.ai_summary.as_deref() {
        prompt.push_str(&format!("Lesson summary:\n{summary}\n\n"));
    }
    if !context.is_empty() {
        prompt.push_str(&format!("Lesson materials:\n{context}\n"));
    }
    prompt.push_str(&format!(
        "Write exactly one question per concept, {count} in total, in the same order as the list.\n\
         Each question has exactly three options a, b and c with exactly one correct option.\n\
         correctExplanation explains why the answer is right and then invites the student to \
         give their own example. Do not start it with \"Yes, that's right\".\n\
         examplePrompt asks the student for a real-world example of the concept; exampleHint \
         helps them find one.\n\n\
         Return JSON of the form:\n\
         {{\"questions\": [{{\"concept\": string, \"conceptDescription\": string, \
         \"multipleChoiceQuestion\": string, \"options\": {{\"a\": string, \"b\": string, \"c\": string}}, \
         \"correctOption\": \"a\" | \"b\" | \"c\", \"correctExplanation\": string, \
         \"examplePrompt\": string, \"exampleHint\": string}}]}}",
        count = concepts.len()
    ));
    prompt
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default)]
    concept: String,
    #[serde(default)]
    concept_description: String,
    multiple_choice_question: String,
    options: HashMap<String, String>,
    correct_option: String,
    correct_explanation: String,
    example_prompt: String,
    #[serde(default)]
    example_hint: String,
}

/// Parses and validates the model output against the lesson's concepts.
pub(crate) fn parse_questions(text: &str, concepts: &[KeyConcept]) -> Result<Vec<ConceptQuestion>> {
    let value = extract_json_object(text)
        .map_err(|e| OakError::GenerationFailed(format!("question set is not JSON: {e}")))?;

    let items = match value.get("questions") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(OakError::GenerationFailed("`questions` is not an array".into())),
        None => return Err(OakError::GenerationFailed("`questions` is missing".into())),
    };

    if items.len() != concepts.len() {
        return Err(OakError::GenerationFailed(format!(
            "expected {} questions, got {}",
            concepts.len(),
            items.len()
        )));
    }

    items
        .iter()
        .zip(concepts)
        .enumerate()
        .map(|(i, (item, concept))| validate_question(i, item.clone(), concept))
        .collect()
}

fn validate_question(index: usize, item: Value, concept: &KeyConcept) -> Result<ConceptQuestion> {
    let fail = |reason: String| OakError::GenerationFailed(format!("question {}: {reason}", index + 1));

    let raw: RawQuestion = serde_json::from_value(item).map_err(|e| fail(e.to_string()))?;

    let mut options: HashMap<String, String> = raw
        .options
        .into_iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .collect();
    if options.len() != 3 {
        return Err(fail(format!("expected 3 options, got {}", options.len())));
    }
    let mut take = |key: &str| -> Result<String> {
        match options.remove(key) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(fail(format!("option {key} is missing or empty"))),
        }
    };
    let options = AnswerOptions {
        a: take("a")?,
        b: take("b")?,
        c: take("c")?,
    };

    let correct_option: OptionKey = raw
        .correct_option
        .parse()
        .map_err(|_| fail(format!("correctOption '{}' is not a, b or c", raw.correct_option)))?;

    if raw.multiple_choice_question.trim().is_empty() {
        return Err(fail("question text is empty".into()));
    }

    // Attempts and analytics key on the lesson's concept name, never the model's.
    if !raw.concept.trim().is_empty() && raw.concept.trim() != concept.concept {
        debug!(
            "Question {} renamed concept '{}' to '{}', keeping the lesson name",
            index + 1,
            concept.concept,
            raw.concept.trim()
        );
    }
    let concept_description = if raw.concept_description.trim().is_empty() {
        concept.description.clone()
    } else {
        raw.concept_description.trim().to_string()
    };

    Ok(ConceptQuestion {
        concept: concept.concept.clone(),
        concept_description,
        multiple_choice_question: raw.multiple_choice_question.trim().to_string(),
        options,
        correct_option,
        correct_explanation: raw.correct_explanation.trim().to_string(),
        example_prompt: raw.example_prompt.trim().to_string(),
        example_hint: raw.example_hint.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn concepts() -> Vec<KeyConcept> {
        vec![
            KeyConcept::new("Photosynthesis", "How plants make food"),
            KeyConcept::new("Respiration", ""),
        ]
    }

    fn question_json(concept: &str, correct: &str) -> Value {
        json!({
            "concept": concept,
            "multipleChoiceQuestion": format!("What is {concept}?"),
            "options": {"a": "one", "b": "two", "C": "three"},
            "correctOption": correct,
            "correctExplanation": "Exactly. Can you think of an example?",
            "examplePrompt": "Give an example.",
            "exampleHint": "Look around you."
        })
    }

    #[test]
    fn parses_valid_output() {
        let text = json!({"questions": [
            question_json("Photosynthesis", "b"),
            question_json("Respiration", "A"),
        ]})
        .to_string();

        let questions = parse_questions(&text, &concepts()).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct_option, OptionKey::B);
        assert_eq!(questions[0].concept_description, "How plants make food");
        assert_eq!(questions[1].correct_option, OptionKey::A);
        assert_eq!(questions[1].options.c, "three");
    }

    #[test]
    fn renamed_concept_keeps_lesson_name() {
        let text = json!({"questions": [
            question_json("photosynthesis (process)", "b"),
            question_json("", "a"),
        ]})
        .to_string();

        let questions = parse_questions(&text, &concepts()).unwrap();
        assert_eq!(questions[0].concept, "Photosynthesis");
        assert_eq!(questions[1].concept, "Respiration");
    }

    #[test]
    fn missing_questions_fails() {
        let err = parse_questions(r#"{"items": []}"#, &concepts()).unwrap_err();
        assert!(matches!(err, OakError::GenerationFailed(_)));

        let err = parse_questions(r#"{"questions": "none"}"#, &concepts()).unwrap_err();
        assert!(matches!(err, OakError::GenerationFailed(_)));
    }

    #[test]
    fn non_json_fails() {
        let err = parse_questions("Sorry, I can't do that.", &concepts()).unwrap_err();
        assert!(matches!(err, OakError::GenerationFailed(_)));
    }

    #[test]
    fn wrong_count_fails() {
        let text = json!({"questions": [question_json("Photosynthesis", "a")]}).to_string();
        assert!(parse_questions(&text, &concepts()).is_err());
    }

    #[test]
    fn bad_correct_option_fails() {
        let text = json!({"questions": [
            question_json("Photosynthesis", "d"),
            question_json("Respiration", "a"),
        ]})
        .to_string();
        let err = parse_questions(&text, &concepts()).unwrap_err();
        assert!(err.to_string().contains("question 1"));
    }

    #[test]
    fn empty_option_fails() {
        let mut q = question_json("Photosynthesis", "a");
        q["options"]["b"] = json!("  ");
        let text = json!({"questions": [q, question_json("Respiration", "a")]}).to_string();
        assert!(parse_questions(&text, &concepts()).is_err());
    }

    #[test]
    fn prompt_lists_concepts_in_order() {
        let lesson = Lesson {
            id: "l1".into(),
            course_id: "c1".into(),
            week_number: 1,
            lesson_number: 1,
            topic: "Plants".into(),
            ai_summary: None,
            key_concepts: Some(concepts()),
            pre_class_reading: None,
            created_at: chrono::Utc::now(),
        };
        let prompt = build_prompt(&lesson, lesson.concepts(), "");
        let first = prompt.find("1. Photosynthesis: How plants make food").unwrap();
        let second = prompt.find("2. Respiration").unwrap();
        assert!(first < second);
        assert!(prompt.contains("2 in total"));
    }
}
