// src/api/http/students.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::error::{required, ApiResult, IntoApiErrorOption};
use crate::student::CreateStudentRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentLessonsQuery {
    pub course_id: Option<String>,
}

/// GET /students
pub async fn list_students(State(app): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let students = app.students.list().await?;
    Ok(Json(json!({ "students": students })))
}

/// POST /students
pub async fn create_student(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<CreateStudentRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = required(payload.name, "name")?;
    let email = payload.email.filter(|e| !e.trim().is_empty());
    let student = app.students.create(name, email).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /students/{id}
pub async fn get_student(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let student = app.students.get(&id).await?.ok_or_not_found("Student not found")?;
    Ok(Json(student))
}

/// GET /students/{id}/lessons?courseId=
/// Polled by the student view to pick up newly ready lessons.
pub async fn student_lessons(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<StudentLessonsQuery>,
) -> ApiResult<impl IntoResponse> {
    let lessons = app
        .dashboard
        .student_lessons(&app.teacher_id, &id, query.course_id.as_deref())
        .await?;
    Ok(Json(json!({ "lessons": lessons })))
}
