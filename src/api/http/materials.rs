// src/api/http/materials.rs
// Material upload, listing, summarization and deletion

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::api::error::{missing_param_error, required, ApiError, ApiResult, IntoApiErrorOption};
use crate::state::AppState;

/// POST /materials (multipart: lessonId, title, file)
pub async fn upload_material(
    State(app): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut lesson_id = None;
    let mut title = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "lessonId" => lesson_id = Some(read_text(field).await?),
            "title" => title = Some(read_text(field).await?),
            "file" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| missing_param_error("file name"))?;
                let bytes = field.bytes().await.map_err(|e| {
                    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        ApiError::payload_too_large("Uploaded file is too large")
                    } else {
                        ApiError::bad_request(format!("Failed to read upload: {e}"))
                    }
                })?;
                file = Some((file_name, bytes.to_vec()));
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let lesson_id = required(lesson_id, "lessonId")?;
    let (file_name, bytes) = file.ok_or_else(|| missing_param_error("file"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| file_name.clone());

    let material = app
        .material_service
        .upload(&lesson_id, title, &file_name, bytes)
        .await?;
    Ok((StatusCode::CREATED, Json(material)))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart field: {e}")))
}

/// GET /lessons/{id}/materials
pub async fn list_materials(
    State(app): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    app.lessons.get(&lesson_id).await?.ok_or_not_found("Lesson not found")?;
    let materials = app.materials.list_for_lesson(&lesson_id).await?;
    Ok(Json(json!({ "materials": materials })))
}

/// GET /materials/{id}
pub async fn get_material(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let material = app.materials.get(&id).await?.ok_or_not_found("Material not found")?;
    Ok(Json(material))
}

/// POST /materials/{id}/summarize
pub async fn summarize_material(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (material, outcome) = app.material_service.summarize_material(&id).await?;
    Ok(Json(json!({
        "success": true,
        "material": material,
        "summary": outcome,
    })))
}

/// DELETE /materials/{id}
pub async fn delete_material(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    app.material_service.delete(&id).await?;
    Ok(Json(json!({ "success": true })))
}
