// src/api/http/chat.rs
// Quiz session endpoints: start, answer, reset, clean, end, state, transcript

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::error::{invalid_param_error, required, ApiResult};
use crate::quiz::AnswerType;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentLessonPayload {
    pub student_id: Option<String>,
    pub lesson_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub session_id: Option<String>,
    pub answer: Option<String>,
    pub answer_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentTextPayload {
    pub session_id: Option<String>,
    pub text: Option<String>,
}

/// POST /chat/start
pub async fn start_chat(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<StudentLessonPayload>,
) -> ApiResult<impl IntoResponse> {
    let student_id = required(payload.student_id, "studentId")?;
    let lesson_id = required(payload.lesson_id, "lessonId")?;

    let outcome = app.quiz.start_session(&student_id, &lesson_id).await?;
    Ok(Json(json!({
        "success": true,
        "sessionId": outcome.session_id,
        "currentQuestion": outcome.current_question,
        "currentPhase": outcome.current_phase,
        "progress": outcome.progress,
        "resumed": outcome.resumed,
    })))
}

/// POST /chat/message
pub async fn answer_chat(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<AnswerPayload>,
) -> ApiResult<impl IntoResponse> {
    let session_id = required(payload.session_id, "sessionId")?;
    let answer = required(payload.answer, "answer")?;
    let answer_type = match required(payload.answer_type, "answerType")?.as_str() {
        "multiple_choice" => AnswerType::MultipleChoice,
        "example" => AnswerType::Example,
        other => {
            return Err(invalid_param_error(
                "answerType",
                &format!("'{other}' is not multiple_choice or example"),
            ))
        }
    };

    let outcome = app.quiz.submit_answer(&session_id, &answer, answer_type).await?;
    Ok(Json(outcome))
}

/// POST /chat/reset
pub async fn reset_chat(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<StudentLessonPayload>,
) -> ApiResult<impl IntoResponse> {
    let student_id = required(payload.student_id, "studentId")?;
    let lesson_id = required(payload.lesson_id, "lessonId")?;

    let outcome = app.quiz.reset_session(&student_id, &lesson_id).await?;
    Ok(Json(json!({
        "success": true,
        "sessionId": outcome.session_id,
        "questionCount": outcome.question_count,
    })))
}

/// POST /chat/clean
pub async fn clean_chat(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<StudentLessonPayload>,
) -> ApiResult<impl IntoResponse> {
    let student_id = required(payload.student_id, "studentId")?;
    let lesson_id = required(payload.lesson_id, "lessonId")?;

    let closed = app.quiz.clean_sessions(&student_id, &lesson_id).await?;
    Ok(Json(json!({ "success": true, "closed": closed })))
}

/// POST /chat/end
pub async fn end_chat(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<SessionPayload>,
) -> ApiResult<impl IntoResponse> {
    let session_id = required(payload.session_id, "sessionId")?;

    let outcome = app.quiz.end_session(&session_id).await?;
    Ok(Json(json!({
        "success": true,
        "analysis": outcome.analysis,
        "session": outcome.session,
        "goodbyeMessage": outcome.goodbye_message,
    })))
}

/// GET /chat/state/{session_id}
pub async fn chat_state(
    State(app): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(app.quiz.session_view(&session_id).await?))
}

/// GET /chat/transcript/{session_id}
pub async fn chat_transcript(
    State(app): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(app.quiz.transcript(&session_id).await?))
}

/// GET /chat-messages/session/{session_id}
pub async fn session_messages(
    State(app): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let messages = app.quiz.messages(&session_id).await?;
    Ok(Json(json!({ "messages": messages })))
}

/// POST /chat-messages
pub async fn post_student_message(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<StudentTextPayload>,
) -> ApiResult<impl IntoResponse> {
    let session_id = required(payload.session_id, "sessionId")?;
    let text = required(payload.text, "text")?;

    let message = app.quiz.post_student_text(&session_id, &text).await?;
    info!(session_id = %session_id, "stored student message {}", message.id);
    Ok(Json(json!({ "success": true, "message": message })))
}
