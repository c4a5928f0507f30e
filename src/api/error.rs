// src/api/error.rs
// Maps domain errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use tracing::error;

use crate::error::OakError;

/// Standard API error response format
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
    pub error_code: Option<String>,
    /// Set when a lesson cannot be chatted about yet; the client stops retrying.
    pub chat_not_available: bool,
}

impl ApiError {
    fn with_code(status_code: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            error_code: Some(code.to_string()),
            chat_not_available: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", message)
    }

    /// The lesson has no key concepts yet.
    pub fn chat_not_available(message: impl Into<String>) -> Self {
        Self {
            chat_not_available: true,
            ..Self::with_code(StatusCode::BAD_REQUEST, "CHAT_NOT_AVAILABLE", message)
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<OakError> for ApiError {
    fn from(err: OakError) -> Self {
        match err {
            OakError::LessonNotReady => ApiError::chat_not_available(
                "This lesson isn't ready for chat yet. Your teacher needs to add key concepts first.",
            ),
            OakError::NoQuestionsToReset => {
                ApiError::with_code(StatusCode::BAD_REQUEST, "NO_QUESTIONS", err.to_string())
            }
            OakError::SessionComplete => {
                ApiError::with_code(StatusCode::BAD_REQUEST, "SESSION_COMPLETE", err.to_string())
            }
            OakError::InvalidInput(_) => ApiError::bad_request(err.to_string()),
            OakError::NotFound(_) => ApiError::not_found(err.to_string()),
            OakError::Conflict(_) => ApiError::conflict(err.to_string()),
            OakError::GenerationFailed(_) => {
                error!("{}", err);
                ApiError::with_code(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_FAILED",
                    err.to_string(),
                )
            }
            other => {
                error!("Request failed: {}", other);
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response_json = json!({
            "error": self.message,
            "status": self.status_code.as_u16()
        });

        if let Some(error_code) = self.error_code {
            response_json["error_code"] = json!(error_code);
        }
        if self.chat_not_available {
            response_json["chatNotAvailable"] = json!(true);
        }

        (self.status_code, Json(response_json)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Extension trait for Option<T> to create ApiError for None cases
pub trait IntoApiErrorOption<T> {
    fn ok_or_not_found(self, message: &str) -> Result<T, ApiError>;
}

impl<T> IntoApiErrorOption<T> for Option<T> {
    fn ok_or_not_found(self, message: &str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}

/// Helper function for missing parameter errors
pub fn missing_param_error(param_name: &str) -> ApiError {
    ApiError::bad_request(format!("Missing required parameter: {param_name}"))
}

/// Helper function for invalid parameter errors
pub fn invalid_param_error(param_name: &str, reason: &str) -> ApiError {
    ApiError::bad_request(format!("Invalid parameter '{param_name}': {reason}"))
}

/// Required string field from a request body; blank counts as missing.
pub fn required(value: Option<String>, param_name: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing_param_error(param_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_not_ready_maps_to_chat_not_available() {
        let error = ApiError::from(OakError::LessonNotReady);
        assert_eq!(error.status_code, StatusCode::BAD_REQUEST);
        assert!(error.chat_not_available);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (OakError::NoQuestionsToReset, StatusCode::BAD_REQUEST),
            (OakError::SessionComplete, StatusCode::BAD_REQUEST),
            (OakError::invalid("bad"), StatusCode::BAD_REQUEST),
            (OakError::not_found("session"), StatusCode::NOT_FOUND),
            (OakError::Conflict("raced".into()), StatusCode::CONFLICT),
            (OakError::GenerationFailed("nope".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (OakError::Llm("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status_code, status);
            assert!(!api.chat_not_available);
        }
    }

    #[test]
    fn test_option_extensions() {
        let none_value: Option<i32> = None;
        let error = none_value.ok_or_not_found("Item not found").unwrap_err();
        assert_eq!(error.status_code, StatusCode::NOT_FOUND);
        assert_eq!(error.message, "Item not found");
    }

    #[test]
    fn test_required_rejects_blank() {
        assert!(required(Some("  ".into()), "studentId").is_err());
        assert!(required(None, "studentId").unwrap_err().message.contains("studentId"));
        assert_eq!(required(Some(" s1 ".into()), "studentId").unwrap(), "s1");
    }
}
