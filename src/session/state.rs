// src/session/state.rs
//! Text codec for the `session_state` and `analysis` columns.

use tracing::warn;

use super::types::{AnalysisReport, SessionState, SessionStatus};
use crate::error::Result;

pub fn encode_state(state: &SessionState) -> Result<String> {
    Ok(serde_json::to_string(state)?)
}

/// Decodes a stored state. Unreadable payloads are treated as "no state",
/// which makes the next start regenerate questions.
pub fn decode_state(session_id: &str, raw: Option<&str>) -> Option<SessionState> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<SessionState>(raw) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!("Session {} has unreadable state: {}", session_id, e);
            None
        }
    }
}

/// Unknown status values read as completed so a bad row never blocks a new
/// session for the same student and lesson.
pub fn decode_status(session_id: &str, raw: &str) -> SessionStatus {
    raw.parse().unwrap_or_else(|e| {
        warn!("Session {} has unreadable status, treating as completed: {}", session_id, e);
        SessionStatus::Completed
    })
}

pub fn encode_analysis(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string(report)?)
}

pub fn decode_analysis(session_id: &str, raw: Option<&str>) -> Option<AnalysisReport> {
    let raw = raw?;
    serde_json::from_str(raw)
        .map_err(|e| warn!("Session {} has unreadable analysis: {}", session_id, e))
        .ok()
}

/// Strengths / misunderstandings lists stored as JSON arrays.
pub fn encode_list(items: Option<&[String]>) -> Result<Option<String>> {
    items
        .map(|items| serde_json::to_string(items).map_err(Into::into))
        .transpose()
}

pub fn decode_list(raw: Option<&str>) -> Option<Vec<String>> {
    raw.and_then(|s| serde_json::from_str(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::{AnswerOptions, ConceptQuestion, OptionKey, Phase};

    fn question(concept: &str) -> ConceptQuestion {
        ConceptQuestion {
            concept: concept.to_string(),
            concept_description: String::new(),
            multiple_choice_question: format!("What is {concept}?"),
            options: AnswerOptions {
                a: "one".into(),
                b: "two".into(),
                c: "three".into(),
            },
            correct_option: OptionKey::B,
            correct_explanation: "Because.".into(),
            example_prompt: "Give an example.".into(),
            example_hint: "Think of plants.".into(),
        }
    }

    #[test]
    fn state_survives_storage() {
        let mut state = SessionState::fresh(vec![question("Photosynthesis")]);
        state.current_phase = Phase::Example;
        let text = encode_state(&state).unwrap();

        assert!(text.contains("\"currentQuestionIndex\":0"));
        assert!(text.contains("\"currentPhase\":\"example\""));
        assert!(text.contains("\"correctOption\":\"b\""));
        assert_eq!(decode_state("s1", Some(text.as_str())), Some(state));
    }

    #[test]
    fn unknown_status_reads_as_completed() {
        assert_eq!(decode_status("s1", "active"), SessionStatus::Active);
        assert_eq!(decode_status("s1", "archived"), SessionStatus::Completed);
    }

    #[test]
    fn legacy_free_text_is_not_state() {
        assert_eq!(decode_state("s1", Some("The student did well.")), None);
        assert_eq!(decode_state("s1", Some("   ")), None);
        assert_eq!(decode_state("s1", None), None);
    }

    #[test]
    fn missing_history_defaults_to_empty() {
        let raw = r#"{"questions":[],"currentQuestionIndex":0,"currentPhase":"multiple_choice"}"#;
        let state = decode_state("s1", Some(raw)).unwrap();
        assert!(state.conversation_history.is_empty());
        assert!(!state.has_questions());
    }

    #[test]
    fn lists_encode_as_json_arrays() {
        let items = vec!["a".to_string(), "b".to_string()];
        let text = encode_list(Some(items.as_slice())).unwrap().unwrap();
        assert_eq!(text, r#"["a","b"]"#);
        assert_eq!(decode_list(Some(text.as_str())), Some(items));
        assert_eq!(encode_list(None).unwrap(), None);
    }
}
