// src/api/http/courses.rs
// Course and lesson CRUD for the configured teacher

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::error::{invalid_param_error, required, ApiResult, IntoApiErrorOption};
use crate::course::CreateCourseRequest;
use crate::lesson::{store::NewLesson, CreateLessonRequest, UpdateLessonRequest};
use crate::state::AppState;

/// GET /courses
pub async fn list_courses(State(app): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let courses = app.courses.list_for_teacher(&app.teacher_id).await?;
    Ok(Json(json!({ "courses": courses })))
}

/// POST /courses
pub async fn create_course(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<CreateCourseRequest>,
) -> ApiResult<impl IntoResponse> {
    let title = required(payload.title, "title")?;
    let course = app
        .courses
        .create(&app.teacher_id, title, payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// GET /courses/{id}
pub async fn get_course(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let course = app.courses.get(&id).await?.ok_or_not_found("Course not found")?;
    Ok(Json(course))
}

/// DELETE /courses/{id}
pub async fn delete_course(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let report = app.cleaner.delete_course(&id).await?;
    Ok(Json(json!({ "success": true, "report": report })))
}

/// GET /courses/{id}/lessons
pub async fn list_lessons(
    State(app): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    app.courses.get(&course_id).await?.ok_or_not_found("Course not found")?;
    let lessons = app.lessons.list_for_course(&course_id).await?;
    Ok(Json(json!({ "lessons": lessons })))
}

/// POST /lessons
pub async fn create_lesson(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<CreateLessonRequest>,
) -> ApiResult<impl IntoResponse> {
    let course_id = required(payload.course_id, "courseId")?;
    let topic = required(payload.topic, "topic")?;
    let week_number = payload.week_number.unwrap_or(1);
    let lesson_number = payload.lesson_number.unwrap_or(1);
    if week_number < 1 || lesson_number < 1 {
        return Err(invalid_param_error("weekNumber/lessonNumber", "must be at least 1"));
    }

    app.courses.get(&course_id).await?.ok_or_not_found("Course not found")?;

    let lesson = app
        .lessons
        .create(NewLesson {
            course_id,
            week_number,
            lesson_number,
            topic,
            key_concepts: payload.key_concepts,
            pre_class_reading: payload.pre_class_reading,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// GET /lessons/{id}
pub async fn get_lesson(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let lesson = app.lessons.get(&id).await?.ok_or_not_found("Lesson not found")?;
    Ok(Json(lesson))
}

/// PATCH /lessons/{id}
pub async fn update_lesson(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<UpdateLessonRequest>,
) -> ApiResult<impl IntoResponse> {
    let lesson = app
        .lessons
        .update(&id, patch)
        .await?
        .ok_or_not_found("Lesson not found")?;
    Ok(Json(lesson))
}

/// DELETE /lessons/{id}
pub async fn delete_lesson(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let report = app.cleaner.delete_lesson(&id).await?;
    Ok(Json(json!({ "success": true, "report": report })))
}

/// POST /lessons/{id}/summarize
pub async fn summarize_lesson(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (lesson, outcome) = app.material_service.summarize_lesson(&id).await?;
    Ok(Json(json!({
        "success": true,
        "lesson": lesson,
        "degraded": outcome.degraded,
    })))
}
