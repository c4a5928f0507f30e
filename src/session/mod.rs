// src/session/mod.rs
//! Chat session persistence: session rows with their quiz state, the message
//! log, the attempt log and per-concept bookkeeping.

pub mod attempts;
pub mod messages;
pub mod progress;
pub mod state;
pub mod store;
pub mod types;

pub use attempts::{Attempt, AttemptStore, NewAttempt};
pub use messages::{MessageBody, MessageStore, Speaker, StoredMessage};
pub use progress::{ConceptProgress, ConceptStatus, DynamicHint, ProgressStore};
pub use store::SessionStore;
pub use types::{
    AnalysisReport, AnswerOptions, ChatSession, ConceptQuestion, OptionKey, Phase, Progress,
    QuestionView, SessionState, SessionStatus,
};
