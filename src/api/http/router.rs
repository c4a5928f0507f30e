// src/api/http/router.rs
// HTTP router composition for the REST API

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::{
    chat::{
        answer_chat, chat_state, chat_transcript, clean_chat, end_chat, post_student_message,
        reset_chat, session_messages, start_chat,
    },
    courses::{
        create_course, create_lesson, delete_course, delete_lesson, get_course, get_lesson,
        list_courses, list_lessons, summarize_lesson, update_lesson,
    },
    handlers::health_handler,
    materials::{delete_material, get_material, list_materials, summarize_material, upload_material},
    students::{create_student, get_student, list_students, student_lessons},
    understanding::{concept_understanding, student_progress, teacher_progress},
};
use crate::state::AppState;

/// Main HTTP router. Nested under /api by `build_app`.
pub fn http_router(app_state: Arc<AppState>) -> Router {
    let upload_limit = app_state.max_upload_bytes;

    Router::new()
        // Health
        .route("/health", get(health_handler))

        // Quiz sessions
        .route("/chat/start", post(start_chat))
        .route("/chat/message", post(answer_chat))
        .route("/chat/reset", post(reset_chat))
        .route("/chat/clean", post(clean_chat))
        .route("/chat/end", post(end_chat))
        .route("/chat/state/{session_id}", get(chat_state))
        .route("/chat/transcript/{session_id}", get(chat_transcript))
        .route("/chat-messages", post(post_student_message))
        .route("/chat-messages/session/{session_id}", get(session_messages))

        // Analytics
        .route("/concept-understanding", get(concept_understanding))
        .route("/teacher/progress", get(teacher_progress).post(student_progress))

        // Courses and lessons
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/{id}", get(get_course).delete(delete_course))
        .route("/courses/{id}/lessons", get(list_lessons))
        .route("/lessons", post(create_lesson))
        .route(
            "/lessons/{id}",
            get(get_lesson).patch(update_lesson).delete(delete_lesson),
        )
        .route("/lessons/{id}/summarize", post(summarize_lesson))
        .route("/lessons/{id}/materials", get(list_materials))

        // Materials
        .route(
            "/materials",
            post(upload_material).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/materials/{id}", get(get_material).delete(delete_material))
        .route("/materials/{id}/summarize", post(summarize_material))

        // Students
        .route("/students", get(list_students).post(create_student))
        .route("/students/{id}", get(get_student))
        .route("/students/{id}/lessons", get(student_lessons))

        .with_state(app_state)
}
