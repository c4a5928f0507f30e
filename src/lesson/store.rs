// src/lesson/store.rs

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use super::types::{KeyConcept, Lesson, UpdateLessonRequest};
use crate::error::Result;

const LESSON_COLUMNS: &str = "id, course_id, week_number, lesson_number, topic, ai_summary, \
                              key_concepts, pre_class_reading, created_at";

#[derive(Clone)]
pub struct LessonStore {
    pool: SqlitePool,
}

/// Fields needed to insert a lesson.
#[derive(Debug, Clone)]
pub struct NewLesson {
    pub course_id: String,
    pub week_number: i64,
    pub lesson_number: i64,
    pub topic: String,
    pub key_concepts: Option<Vec<KeyConcept>>,
    pub pre_class_reading: Option<String>,
}

impl LessonStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewLesson) -> Result<Lesson> {
        let lesson = Lesson {
            id: Uuid::new_v4().to_string(),
            course_id: new.course_id,
            week_number: new.week_number,
            lesson_number: new.lesson_number,
            topic: new.topic,
            ai_summary: None,
            key_concepts: new.key_concepts,
            pre_class_reading: new.pre_class_reading,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO lessons (
                id, course_id, week_number, lesson_number, topic,
                ai_summary, key_concepts, pre_class_reading, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&lesson.id)
        .bind(&lesson.course_id)
        .bind(lesson.week_number)
        .bind(lesson.lesson_number)
        .bind(&lesson.topic)
        .bind(&lesson.ai_summary)
        .bind(encode_concepts(lesson.key_concepts.as_deref())?)
        .bind(&lesson.pre_class_reading)
        .bind(lesson.created_at)
        .execute(&self.pool)
        .await?;

        Ok(lesson)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Lesson>> {
        let row = sqlx::query(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Self::row_to_lesson(&r)))
    }

    /// Lessons of a course in syllabus order.
    pub async fn list_for_course(&self, course_id: &str) -> Result<Vec<Lesson>> {
        let rows = sqlx::query(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = ? \
             ORDER BY week_number, lesson_number"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_lesson).collect())
    }

    /// Applies the provided fields; `None` leaves a column untouched.
    pub async fn update(&self, id: &str, patch: UpdateLessonRequest) -> Result<Option<Lesson>> {
        let Some(mut lesson) = self.get(id).await? else {
            return Ok(None);
        };

        if let Some(week_number) = patch.week_number {
            lesson.week_number = week_number;
        }
        if let Some(lesson_number) = patch.lesson_number {
            lesson.lesson_number = lesson_number;
        }
        if let Some(topic) = patch.topic {
            lesson.topic = topic;
        }
        if patch.ai_summary.is_some() {
            lesson.ai_summary = patch.ai_summary;
        }
        if patch.key_concepts.is_some() {
            lesson.key_concepts = patch.key_concepts;
        }
        if patch.pre_class_reading.is_some() {
            lesson.pre_class_reading = patch.pre_class_reading;
        }

        sqlx::query(
            r#"
            UPDATE lessons
            SET week_number = ?, lesson_number = ?, topic = ?, ai_summary = ?,
                key_concepts = ?, pre_class_reading = ?
            WHERE id = ?
            "#,
        )
        .bind(lesson.week_number)
        .bind(lesson.lesson_number)
        .bind(&lesson.topic)
        .bind(&lesson.ai_summary)
        .bind(encode_concepts(lesson.key_concepts.as_deref())?)
        .bind(&lesson.pre_class_reading)
        .bind(&lesson.id)
        .execute(&self.pool)
        .await?;

        Ok(Some(lesson))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_lesson(row: &SqliteRow) -> Lesson {
        let id: String = row.get("id");
        let key_concepts: Option<String> = row.get("key_concepts");

        Lesson {
            key_concepts: decode_concepts(&id, key_concepts.as_deref()),
            id,
            course_id: row.get("course_id"),
            week_number: row.get("week_number"),
            lesson_number: row.get("lesson_number"),
            topic: row.get("topic"),
            ai_summary: row.get("ai_summary"),
            pre_class_reading: row.get("pre_class_reading"),
            created_at: row.get("created_at"),
        }
    }
}

pub(crate) fn encode_concepts(concepts: Option<&[KeyConcept]>) -> Result<Option<String>> {
    Ok(match concepts {
        Some(list) => Some(serde_json::to_string(list)?),
        None => None,
    })
}

pub(crate) fn decode_concepts(owner_id: &str, raw: Option<&str>) -> Option<Vec<KeyConcept>> {
    let raw = raw?;
    match serde_json::from_str(raw) {
        Ok(concepts) => Some(concepts),
        Err(e) => {
            warn!("Ignoring unreadable key_concepts on {}: {}", owner_id, e);
            None
        }
    }
}
