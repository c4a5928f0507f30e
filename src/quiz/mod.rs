// src/quiz/mod.rs
//! The conversational quiz engine: session lifecycle, answer evaluation,
//! end-of-session analysis and transcript rendering.

pub mod analysis;
pub mod evaluator;
pub mod generator;
pub mod grader;
pub mod lifecycle;
pub mod transcript;

use sqlx::SqlitePool;
use std::sync::Arc;

pub use analysis::SessionAnalyst;
pub use evaluator::{AnswerOutcome, AnswerType};
pub use generator::QuestionSetGenerator;
pub use grader::{ExampleGrader, Grade};
pub use lifecycle::{EndOutcome, ResetOutcome, SessionView, StartOutcome};
pub use transcript::{Transcript, TranscriptEntry};

use crate::lesson::LessonStore;
use crate::llm::LlmProvider;
use crate::material::MaterialStore;
use crate::session::{
    AttemptStore, ConceptQuestion, MessageBody, MessageStore, ProgressStore, SessionStore,
};
use crate::student::StudentStore;

#[derive(Clone)]
pub struct QuizService {
    students: StudentStore,
    lessons: LessonStore,
    materials: MaterialStore,
    sessions: SessionStore,
    messages: MessageStore,
    attempts: AttemptStore,
    progress: ProgressStore,
    generator: QuestionSetGenerator,
    grader: ExampleGrader,
    analyst: SessionAnalyst,
}

impl QuizService {
    pub fn new(pool: SqlitePool, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            students: StudentStore::new(pool.clone()),
            lessons: LessonStore::new(pool.clone()),
            materials: MaterialStore::new(pool.clone()),
            sessions: SessionStore::new(pool.clone()),
            messages: MessageStore::new(pool.clone()),
            attempts: AttemptStore::new(pool.clone()),
            progress: ProgressStore::new(pool),
            generator: QuestionSetGenerator::new(provider.clone()),
            grader: ExampleGrader::new(provider.clone()),
            analyst: SessionAnalyst::new(provider),
        }
    }
}

/// The tutor message that presents question `index`.
pub(crate) fn question_message(question: &ConceptQuestion, index: usize) -> MessageBody {
    MessageBody::MultipleChoice {
        message: question.multiple_choice_question.clone(),
        options: question.options.clone(),
        concept: question.concept.clone(),
        question_index: index,
    }
}
