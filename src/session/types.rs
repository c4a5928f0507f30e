// src/session/types.rs
//! Quiz session data: questions, phases, progression state, session rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OakError;

/// One of the three multiple-choice options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKey {
    A,
    B,
    C,
}

impl OptionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::A => "a",
            OptionKey::B => "b",
            OptionKey::C => "c",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = OakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a" => Ok(OptionKey::A),
            "b" => Ok(OptionKey::B),
            "c" => Ok(OptionKey::C),
            other => Err(OakError::invalid(format!("'{other}' is not one of a, b, c"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOptions {
    pub a: String,
    pub b: String,
    pub c: String,
}

impl AnswerOptions {
    pub fn get(&self, key: OptionKey) -> &str {
        match key {
            OptionKey::A => &self.a,
            OptionKey::B => &self.b,
            OptionKey::C => &self.c,
        }
    }
}

/// A generated multiple-choice-then-example question for one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptQuestion {
    pub concept: String,
    #[serde(default)]
    pub concept_description: String,
    pub multiple_choice_question: String,
    pub options: AnswerOptions,
    pub correct_option: OptionKey,
    pub correct_explanation: String,
    pub example_prompt: String,
    pub example_hint: String,
}

/// What the client may see of a question (no answer key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub question_index: usize,
    pub concept: String,
    pub concept_description: String,
    pub question: String,
    pub options: AnswerOptions,
}

impl QuestionView {
    pub fn of(question: &ConceptQuestion, question_index: usize) -> Self {
        Self {
            question_index,
            concept: question.concept.clone(),
            concept_description: question.concept_description.clone(),
            question: question.multiple_choice_question.clone(),
            options: question.options.clone(),
        }
    }
}

/// Sub-stage within a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    MultipleChoice,
    Example,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::MultipleChoice => "multiple_choice",
            Phase::Example => "example",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub percentage: u32,
}

impl Progress {
    /// Progress while positioned on question `index` of `total`.
    pub fn at(index: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            ((100.0 * index as f64) / total as f64).round() as u32
        };
        Self {
            current: (index + 1).min(total),
            total,
            percentage,
        }
    }
}

/// Quiz progression persisted with the session.
/// `current_question_index == questions.len()` means the quiz is finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub questions: Vec<ConceptQuestion>,
    pub current_question_index: usize,
    pub current_phase: Phase,
    #[serde(default)]
    pub conversation_history: Vec<serde_json::Value>,
}

impl SessionState {
    pub fn fresh(questions: Vec<ConceptQuestion>) -> Self {
        Self {
            questions,
            current_question_index: 0,
            current_phase: Phase::MultipleChoice,
            conversation_history: Vec::new(),
        }
    }

    /// Same questions, back at the first one.
    pub fn rewound(&self) -> Self {
        Self::fresh(self.questions.clone())
    }

    pub fn has_questions(&self) -> bool {
        !self.questions.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.current_question_index >= self.questions.len()
    }

    pub fn current_question(&self) -> Option<&ConceptQuestion> {
        self.questions.get(self.current_question_index)
    }

    pub fn current_view(&self) -> Option<QuestionView> {
        self.current_question()
            .map(|q| QuestionView::of(q, self.current_question_index))
    }

    pub fn progress(&self) -> Progress {
        Progress::at(self.current_question_index, self.questions.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = OakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(OakError::invalid(format!("unknown session status '{other}'"))),
        }
    }
}

/// Holistic end-of-session report from the free-form chat flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub understanding_level: u8,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub misunderstandings: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl AnalysisReport {
    /// Used when the model's analysis cannot be read.
    pub fn neutral() -> Self {
        Self {
            understanding_level: 50,
            strengths: Vec::new(),
            misunderstandings: Vec::new(),
            summary: "Unable to generate a detailed analysis for this session.".to_string(),
        }
    }
}

/// One (student, lesson) quiz run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub student_id: String,
    pub lesson_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub understanding_level: Option<i64>,
    pub strengths: Option<Vec<String>>,
    pub misunderstandings: Option<Vec<String>>,
    /// Live quiz progression
    pub state: Option<SessionState>,
    /// Written by the end-of-session analysis
    pub analysis: Option<AnalysisReport>,
    /// Bumped on every state write
    pub version: i64,
}

impl ChatSession {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// State with a usable question list, if any.
    pub fn quiz_state(&self) -> Option<&SessionState> {
        self.state.as_ref().filter(|s| s.has_questions())
    }
}
