// src/material/store.rs

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::types::Material;
use crate::error::Result;
use crate::lesson::store::{decode_concepts, encode_concepts};
use crate::lesson::KeyConcept;

const MATERIAL_COLUMNS: &str = "id, lesson_id, title, file_name, mime_type, content_text, \
                                summary, key_concepts, created_at";

#[derive(Clone)]
pub struct MaterialStore {
    pool: SqlitePool,
}

impl MaterialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        lesson_id: &str,
        title: String,
        file_name: String,
        mime_type: String,
        content_text: Option<String>,
    ) -> Result<Material> {
        let material = Material {
            id: Uuid::new_v4().to_string(),
            lesson_id: lesson_id.to_string(),
            title,
            file_name,
            mime_type,
            content_text,
            summary: None,
            key_concepts: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO materials (
                id, lesson_id, title, file_name, mime_type,
                content_text, summary, key_concepts, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, NULL, NULL, ?)
            "#,
        )
        .bind(&material.id)
        .bind(&material.lesson_id)
        .bind(&material.title)
        .bind(&material.file_name)
        .bind(&material.mime_type)
        .bind(&material.content_text)
        .bind(material.created_at)
        .execute(&self.pool)
        .await?;

        Ok(material)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Material>> {
        let row = sqlx::query(&format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Self::row_to_material(&r)))
    }

    pub async fn list_for_lesson(&self, lesson_id: &str) -> Result<Vec<Material>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE lesson_id = ? ORDER BY created_at, rowid"
        ))
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_material).collect())
    }

    pub async fn save_summary(
        &self,
        id: &str,
        summary: &str,
        key_concepts: &[KeyConcept],
    ) -> Result<()> {
        sqlx::query("UPDATE materials SET summary = ?, key_concepts = ? WHERE id = ?")
            .bind(summary)
            .bind(encode_concepts(Some(key_concepts))?)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM materials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_lesson(&self, lesson_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM materials WHERE lesson_id = ?")
            .bind(lesson_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    fn row_to_material(row: &SqliteRow) -> Material {
        let id: String = row.get("id");
        let key_concepts: Option<String> = row.get("key_concepts");

        Material {
            key_concepts: decode_concepts(&id, key_concepts.as_deref()),
            id,
            lesson_id: row.get("lesson_id"),
            title: row.get("title"),
            file_name: row.get("file_name"),
            mime_type: row.get("mime_type"),
            content_text: row.get("content_text"),
            summary: row.get("summary"),
            created_at: row.get("created_at"),
        }
    }
}
