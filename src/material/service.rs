// src/material/service.rs

use tracing::{info, warn};

use super::extract::extract_text;
use super::storage::FileStorage;
use super::store::MaterialStore;
use super::summarize::MaterialSummarizer;
use super::types::{Material, SummaryOutcome};
use crate::error::{OakError, Result};
use crate::lesson::{Lesson, LessonStore, UpdateLessonRequest};

/// Upload, summarize and delete materials.
#[derive(Clone)]
pub struct MaterialService {
    materials: MaterialStore,
    lessons: LessonStore,
    storage: FileStorage,
    summarizer: MaterialSummarizer,
}

impl MaterialService {
    pub fn new(
        materials: MaterialStore,
        lessons: LessonStore,
        storage: FileStorage,
        summarizer: MaterialSummarizer,
    ) -> Self {
        Self {
            materials,
            lessons,
            storage,
            summarizer,
        }
    }

    pub async fn upload(
        &self,
        lesson_id: &str,
        title: String,
        original_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Material> {
        self.lessons
            .get(lesson_id)
            .await?
            .ok_or_else(|| OakError::not_found("lesson"))?;

        let name = original_name.to_string();
        let (text, bytes) = tokio::task::spawn_blocking(move || {
            let text = extract_text(&name, &bytes);
            (text, bytes)
        })
        .await
        .map_err(|e| OakError::Anyhow(e.into()))?;
        let text = text.map_err(|e| OakError::invalid(e.to_string()))?;

        let file_name = self.storage.save(original_name, &bytes).await?;
        let mime_type = mime_guess::from_path(original_name)
            .first_or_octet_stream()
            .to_string();

        match self
            .materials
            .create(lesson_id, title, file_name.clone(), mime_type, Some(text))
            .await
        {
            Ok(material) => {
                info!("Uploaded material {} for lesson {}", material.id, lesson_id);
                Ok(material)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&file_name).await {
                    warn!("Failed to remove orphaned upload {}: {}", file_name, cleanup);
                }
                Err(e)
            }
        }
    }

    pub async fn summarize_material(&self, id: &str) -> Result<(Material, SummaryOutcome)> {
        let mut material = self
            .materials
            .get(id)
            .await?
            .ok_or_else(|| OakError::not_found("material"))?;

        let outcome = self.summarizer.summarize_material(&material).await;
        self.materials
            .save_summary(id, &outcome.summary, &outcome.key_concepts)
            .await?;

        material.summary = Some(outcome.summary.clone());
        material.key_concepts = Some(outcome.key_concepts.clone());
        Ok((material, outcome))
    }

    /// Writes the lesson `ai_summary`; key concepts are replaced only when the
    /// merge produced some.
    pub async fn summarize_lesson(&self, lesson_id: &str) -> Result<(Lesson, SummaryOutcome)> {
        let lesson = self
            .lessons
            .get(lesson_id)
            .await?
            .ok_or_else(|| OakError::not_found("lesson"))?;
        let materials = self.materials.list_for_lesson(lesson_id).await?;

        let outcome = self.summarizer.summarize_lesson(&lesson, &materials).await;
        let patch = UpdateLessonRequest {
            ai_summary: Some(outcome.summary.clone()),
            key_concepts: (!outcome.key_concepts.is_empty()).then(|| outcome.key_concepts.clone()),
            ..Default::default()
        };

        let lesson = self
            .lessons
            .update(lesson_id, patch)
            .await?
            .ok_or_else(|| OakError::not_found("lesson"))?;
        Ok((lesson, outcome))
    }

    /// The stored file is removed best-effort; the row delete is strict.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let material = self
            .materials
            .get(id)
            .await?
            .ok_or_else(|| OakError::not_found("material"))?;

        if let Err(e) = self.storage.delete(&material.file_name).await {
            warn!("Failed to delete stored file {}: {}", material.file_name, e);
        }

        self.materials.delete(id).await?;
        info!("Deleted material {}", id);
        Ok(())
    }
}
