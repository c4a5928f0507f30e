// src/quiz/transcript.rs
//! Replays the stored message log as a linear chat transcript.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::{AnswerOptions, MessageBody, Phase, Progress, SessionState, Speaker, StoredMessage};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub role: Speaker,
    pub kind: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<AnswerOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_positive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub is_terminal: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub entries: Vec<TranscriptEntry>,
    pub progress: Progress,
    pub current_phase: Phase,
    pub is_complete: bool,
}

impl Transcript {
    /// "Speaker: text" lines, as fed to the session analyst.
    pub fn as_plain_text(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                let who = match e.role {
                    Speaker::Tutor => "Tutor",
                    Speaker::Student => "Student",
                    Speaker::Grader => "Sage",
                };
                format!("{who}: {}", e.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn render(messages: &[StoredMessage], state: Option<&SessionState>) -> Transcript {
    let entries: Vec<TranscriptEntry> = messages.iter().map(|m| entry(m, state)).collect();

    let state = state.filter(|s| s.has_questions());
    let (progress, current_phase, state_complete) = match state {
        Some(s) => (s.progress(), s.current_phase, s.is_complete()),
        None => (Progress::at(0, 0), Phase::MultipleChoice, false),
    };
    let is_complete = state_complete || entries.iter().any(|e| e.is_terminal);

    Transcript {
        entries,
        progress,
        current_phase,
        is_complete,
    }
}

fn entry(message: &StoredMessage, state: Option<&SessionState>) -> TranscriptEntry {
    let mut entry = TranscriptEntry {
        role: message.speaker,
        kind: message.body.kind(),
        text: String::new(),
        options: None,
        question_index: None,
        is_positive: None,
        hint: None,
        is_terminal: message.is_terminal,
        timestamp: message.timestamp,
    };

    match &message.body {
        MessageBody::MultipleChoice {
            message,
            options,
            question_index,
            ..
        } => {
            entry.text = message.clone();
            entry.options = Some(options.clone());
            entry.question_index = Some(*question_index);
        }
        MessageBody::MultipleChoiceAnswer {
            selected,
            question_index,
        } => {
            let label = selected.as_str().to_uppercase();
            let option_text = state
                .and_then(|s| s.questions.get(*question_index))
                .map(|q| q.options.get(*selected).to_string());
            entry.text = match option_text {
                Some(text) => format!("{label}) {text}"),
                None => label,
            };
            entry.question_index = Some(*question_index);
        }
        MessageBody::ExampleSubmission {
            content,
            question_index,
        } => {
            entry.text = content.clone();
            entry.question_index = Some(*question_index);
        }
        MessageBody::Feedback {
            message,
            is_positive,
            hint,
        } => {
            entry.text = message.clone();
            entry.is_positive = Some(*is_positive);
            entry.hint = hint.clone();
        }
        MessageBody::Text { message } => entry.text = message.clone(),
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ConceptQuestion, OptionKey};

    fn msg(id: i64, speaker: Speaker, body: MessageBody, is_terminal: bool) -> StoredMessage {
        StoredMessage {
            id,
            session_id: "s1".into(),
            speaker,
            body,
            is_terminal,
            timestamp: Utc::now(),
        }
    }

    fn state() -> SessionState {
        SessionState::fresh(vec![ConceptQuestion {
            concept: "Gravity".into(),
            concept_description: String::new(),
            multiple_choice_question: "What pulls apples down?".into(),
            options: AnswerOptions {
                a: "Magnetism".into(),
                b: "Gravity".into(),
                c: "Wind".into(),
            },
            correct_option: OptionKey::B,
            correct_explanation: "Right.".into(),
            example_prompt: "Example?".into(),
            example_hint: "Drop something.".into(),
        }])
    }

    #[test]
    fn renders_roles_and_answers() {
        let state = state();
        let messages = vec![
            msg(1, Speaker::Tutor, crate::quiz::question_message(&state.questions[0], 0), false),
            msg(
                2,
                Speaker::Student,
                MessageBody::MultipleChoiceAnswer {
                    selected: OptionKey::B,
                    question_index: 0,
                },
                false,
            ),
            msg(
                3,
                Speaker::Grader,
                MessageBody::Feedback {
                    message: "Right.".into(),
                    is_positive: true,
                    hint: None,
                },
                false,
            ),
        ];

        let transcript = render(&messages, Some(&state));
        assert_eq!(transcript.entries.len(), 3);
        assert_eq!(transcript.entries[0].options.as_ref().unwrap().b, "Gravity");
        assert_eq!(transcript.entries[1].text, "B) Gravity");
        assert_eq!(transcript.entries[2].role, Speaker::Grader);
        assert_eq!(transcript.entries[2].is_positive, Some(true));
        assert!(!transcript.is_complete);
        assert_eq!(transcript.progress.total, 1);
    }

    #[test]
    fn terminal_message_completes_transcript() {
        let messages = vec![msg(1, Speaker::Tutor, MessageBody::text("Congratulations!"), true)];
        let transcript = render(&messages, None);
        assert!(transcript.is_complete);
        assert_eq!(transcript.progress.total, 0);
    }

    #[test]
    fn congratulations_text_alone_is_not_terminal() {
        let messages = vec![msg(1, Speaker::Tutor, MessageBody::text("Congratulations!"), false)];
        assert!(!render(&messages, Some(&state())).is_complete);
    }

    #[test]
    fn plain_text_labels_speakers() {
        let messages = vec![
            msg(1, Speaker::Student, MessageBody::text("Hi"), false),
            msg(2, Speaker::Grader, MessageBody::text("Hello"), false),
        ];
        assert_eq!(render(&messages, None).as_plain_text(), "Student: Hi\nSage: Hello");
    }
}
