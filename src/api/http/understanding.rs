// src/api/http/understanding.rs
// Understanding analytics and teacher dashboards

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::error::{required, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderstandingQuery {
    pub lesson_id: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub course_id: Option<String>,
    pub lesson_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrilldownPayload {
    pub student_id: Option<String>,
    pub lesson_id: Option<String>,
}

/// GET /concept-understanding?lessonId=&studentId=
pub async fn concept_understanding(
    State(app): State<Arc<AppState>>,
    Query(query): Query<UnderstandingQuery>,
) -> ApiResult<impl IntoResponse> {
    let lesson_id = required(query.lesson_id, "lessonId")?;
    let student_id = query.student_id.filter(|s| !s.trim().is_empty());

    let data = app
        .understanding
        .concept_understanding(&lesson_id, student_id.as_deref())
        .await?;
    Ok(Json(json!({ "data": data })))
}

/// GET /teacher/progress?courseId=&lessonId=
pub async fn teacher_progress(
    State(app): State<Arc<AppState>>,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<impl IntoResponse> {
    let courses = app
        .dashboard
        .fleet_progress(
            &app.teacher_id,
            query.course_id.as_deref(),
            query.lesson_id.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "courses": courses })))
}

/// POST /teacher/progress
pub async fn student_progress(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<DrilldownPayload>,
) -> ApiResult<impl IntoResponse> {
    let student_id = required(payload.student_id, "studentId")?;
    let lesson_id = required(payload.lesson_id, "lessonId")?;

    Ok(Json(app.dashboard.student_drilldown(&student_id, &lesson_id).await?))
}
