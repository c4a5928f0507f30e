// src/error.rs
// Domain error type for OakTree

use thiserror::Error;

/// Main error type for the OakTree library
#[derive(Error, Debug)]
pub enum OakError {
    #[error("lesson has no key concepts yet, chat is not available")]
    LessonNotReady,

    #[error("LLM output unusable: {0}")]
    GenerationFailed(String),

    #[error("session has no questions to reset")]
    NoQuestionsToReset,

    #[error("session is already complete")]
    SessionComplete,

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Convenience type alias for Result using OakError
pub type Result<T> = std::result::Result<T, OakError>;

impl OakError {
    pub fn not_found(what: impl Into<String>) -> Self {
        OakError::NotFound(what.into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        OakError::InvalidInput(reason.into())
    }
}

/// True when a sqlx error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_not_ready_message() {
        let err = OakError::LessonNotReady;
        assert!(err.to_string().contains("key concepts"));
    }

    #[test]
    fn test_generation_failed_message_names_the_cause() {
        let err = OakError::GenerationFailed("grading output is not JSON".into());
        assert_eq!(err.to_string(), "LLM output unusable: grading output is not JSON");
    }

    #[test]
    fn test_not_found_helper() {
        let err = OakError::not_found("session");
        assert!(matches!(err, OakError::NotFound(_)));
        assert_eq!(err.to_string(), "session not found");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: OakError = json_err.into();
        assert!(matches!(err, OakError::Json(_)));
    }

    #[test]
    fn test_row_not_found_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
