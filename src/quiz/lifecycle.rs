// src/quiz/lifecycle.rs
//! Start / resume, reset, clean and end of quiz sessions.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::transcript::{self, Transcript};
use super::{question_message, QuizService};
use crate::error::{OakError, Result};
use crate::session::{
    AnalysisReport, ChatSession, ConceptProgress, ConceptStatus, DynamicHint, MessageBody, Phase,
    Progress, QuestionView, SessionState, SessionStatus, Speaker, StoredMessage,
};

const GOODBYE_MESSAGE: &str =
    "Thanks for chatting with me today! Your teacher can now see how this session went.";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOutcome {
    pub session_id: String,
    pub current_question: Option<QuestionView>,
    pub current_phase: Phase,
    pub progress: Progress,
    pub resumed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetOutcome {
    pub session_id: String,
    pub question_count: usize,
}

/// Read-only snapshot of where a session stands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub status: SessionStatus,
    pub current_question: Option<QuestionView>,
    pub current_phase: Phase,
    pub progress: Progress,
    pub is_complete: bool,
    pub concepts: Vec<ConceptProgress>,
    pub hints: Vec<DynamicHint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOutcome {
    pub analysis: AnalysisReport,
    pub session: ChatSession,
    pub goodbye_message: String,
}

impl QuizService {
    /// Resumes the active session for (student, lesson) or opens a new one.
    /// Questions are generated at most once per session.
    pub async fn start_session(&self, student_id: &str, lesson_id: &str) -> Result<StartOutcome> {
        // Student and lesson readiness are checked before any session row exists.
        self.students
            .get(student_id)
            .await?
            .ok_or_else(|| OakError::not_found("student"))?;
        let lesson = self
            .lessons
            .get(lesson_id)
            .await?
            .ok_or_else(|| OakError::not_found("lesson"))?;
        if !lesson.is_chat_ready() {
            return Err(OakError::LessonNotReady);
        }

        let mut active = self.sessions.find_active(student_id, lesson_id).await?;

        // A finished quiz left active is closed so the student gets a fresh one.
        if let Some(session) = active.as_ref() {
            if session.quiz_state().is_some_and(SessionState::is_complete) {
                info!("Closing finished session {} left active", session.id);
                self.sessions.complete(&session.id).await?;
                active = None;
            }
        }

        if let Some(session) = active.as_ref() {
            if let Some(state) = session.quiz_state() {
                debug!(
                    "Resuming session {} at question {}",
                    session.id, state.current_question_index
                );
                return Ok(StartOutcome {
                    session_id: session.id.clone(),
                    current_question: state.current_view(),
                    current_phase: state.current_phase,
                    progress: state.progress(),
                    resumed: true,
                });
            }
        }

        let created = active.is_none();
        let session = match active {
            Some(session) => session,
            None => self.sessions.create(student_id, lesson_id).await?,
        };

        let materials = self.materials.list_for_lesson(lesson_id).await?;
        let questions = self.generator.generate(&lesson, &materials).await?;
        let state = SessionState::fresh(questions);
        self.sessions.save_state(&session.id, &state, session.version).await?;

        let Some(first) = state.current_question() else {
            return Err(OakError::GenerationFailed("no questions were generated".into()));
        };
        self.progress
            .upsert_concept(&session.id, &first.concept, ConceptStatus::MultipleChoice)
            .await?;

        if created {
            self.messages
                .append(&session.id, Speaker::Tutor, &question_message(first, 0), false)
                .await?;
        }

        info!(
            "Started session {} for student {} on lesson {} ({} questions)",
            session.id,
            student_id,
            lesson_id,
            state.questions.len()
        );

        Ok(StartOutcome {
            session_id: session.id,
            current_question: state.current_view(),
            current_phase: state.current_phase,
            progress: state.progress(),
            resumed: false,
        })
    }

    /// Same quiz, clean slate: history for the latest session is erased and
    /// its question set rewound to the first question.
    pub async fn reset_session(&self, student_id: &str, lesson_id: &str) -> Result<ResetOutcome> {
        let session = self
            .sessions
            .find_latest(student_id, lesson_id)
            .await?
            .ok_or_else(|| OakError::not_found("session"))?;
        self.rewind(session).await
    }

    /// History is erased only after the rewind write has gone through.
    async fn rewind(&self, session: ChatSession) -> Result<ResetOutcome> {
        let Some(state) = session.quiz_state() else {
            return Err(OakError::NoQuestionsToReset);
        };
        let rewound = state.rewound();

        self.sessions.restart(&session.id, &rewound, session.version).await?;
        self.clear_session_history(&session.id).await;

        if let Some(first) = rewound.current_question() {
            self.progress
                .upsert_concept(&session.id, &first.concept, ConceptStatus::MultipleChoice)
                .await?;
            self.messages
                .append(&session.id, Speaker::Tutor, &question_message(first, 0), false)
                .await?;
        }

        info!("Reset session {} ({} questions kept)", session.id, rewound.questions.len());
        Ok(ResetOutcome {
            session_id: session.id,
            question_count: rewound.questions.len(),
        })
    }

    /// Archives active sessions for (student, lesson) without deleting data.
    pub async fn clean_sessions(&self, student_id: &str, lesson_id: &str) -> Result<u64> {
        let closed = self.sessions.complete_active(student_id, lesson_id).await?;
        info!(
            "Archived {} active session(s) for student {} on lesson {}",
            closed, student_id, lesson_id
        );
        Ok(closed)
    }

    pub async fn session_view(&self, session_id: &str) -> Result<SessionView> {
        let session = self.load_session(session_id).await?;
        let (current_question, current_phase, progress, is_complete) = match session.quiz_state() {
            Some(state) => (
                state.current_view(),
                state.current_phase,
                state.progress(),
                state.is_complete(),
            ),
            None => (None, Phase::MultipleChoice, Progress::at(0, 0), false),
        };
        let concepts = self.progress.list_concepts(session_id).await?;
        let hints = self.progress.list_hints(session_id).await?;

        Ok(SessionView {
            session_id: session.id,
            status: session.status,
            current_question,
            current_phase,
            progress,
            is_complete,
            concepts,
            hints,
        })
    }

    pub async fn messages(&self, session_id: &str) -> Result<Vec<StoredMessage>> {
        self.load_session(session_id).await?;
        self.messages.list(session_id).await
    }

    pub async fn transcript(&self, session_id: &str) -> Result<Transcript> {
        let session = self.load_session(session_id).await?;
        let messages = self.messages.list(session_id).await?;
        Ok(transcript::render(&messages, session.state.as_ref()))
    }

    /// Free-form chat: stores a plain student message.
    pub async fn post_student_text(&self, session_id: &str, text: &str) -> Result<StoredMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(OakError::invalid("message text is empty"));
        }
        let session = self.load_session(session_id).await?;
        if !session.is_active() {
            return Err(OakError::SessionComplete);
        }
        self.messages
            .append(session_id, Speaker::Student, &MessageBody::text(text), false)
            .await
    }

    /// Free-form chat close-out: holistic analysis of the whole transcript.
    pub async fn end_session(&self, session_id: &str) -> Result<EndOutcome> {
        let session = self.load_session(session_id).await?;
        let concepts = match self.lessons.get(&session.lesson_id).await? {
            Some(lesson) => lesson.key_concepts.unwrap_or_default(),
            None => Vec::new(),
        };

        let messages = self.messages.list(session_id).await?;
        let rendered = transcript::render(&messages, session.state.as_ref());
        let analysis = self.analyst.analyze(&concepts, &rendered.as_plain_text()).await;

        self.sessions.save_analysis(session_id, &analysis).await?;
        self.messages
            .append(session_id, Speaker::Tutor, &MessageBody::text(GOODBYE_MESSAGE), true)
            .await?;

        let session = self.load_session(session_id).await?;
        info!(
            "Ended session {} with understanding level {}",
            session_id, analysis.understanding_level
        );

        Ok(EndOutcome {
            analysis,
            session,
            goodbye_message: GOODBYE_MESSAGE.to_string(),
        })
    }

    pub(crate) async fn load_session(&self, session_id: &str) -> Result<ChatSession> {
        self.sessions
            .get(session_id)
            .await?
            .ok_or_else(|| OakError::not_found("session"))
    }

    /// Best-effort wipe of a session's messages, attempts and bookkeeping.
    async fn clear_session_history(&self, session_id: &str) {
        if let Err(e) = self.messages.delete_for_session(session_id).await {
            warn!("Failed to delete messages for session {}: {}", session_id, e);
        }
        if let Err(e) = self.progress.delete_concepts_for_session(session_id).await {
            warn!("Failed to delete concept progress for session {}: {}", session_id, e);
        }
        if let Err(e) = self.attempts.delete_for_session(session_id).await {
            warn!("Failed to delete attempts for session {}: {}", session_id, e);
        }
        if let Err(e) = self.progress.delete_hints_for_session(session_id).await {
            warn!("Failed to delete hints for session {}: {}", session_id, e);
        }
    }
}
