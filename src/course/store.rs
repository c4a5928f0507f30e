// src/course/store.rs

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::types::Course;
use crate::error::Result;

#[derive(Clone)]
pub struct CourseStore {
    pool: SqlitePool,
}

impl CourseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        teacher_id: &str,
        title: String,
        description: Option<String>,
    ) -> Result<Course> {
        let course = Course {
            id: Uuid::new_v4().to_string(),
            teacher_id: teacher_id.to_string(),
            title,
            description,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO courses (id, teacher_id, title, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&course.id)
        .bind(&course.teacher_id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.created_at)
        .execute(&self.pool)
        .await?;

        Ok(course)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Course>> {
        let row = sqlx::query(
            "SELECT id, teacher_id, title, description, created_at FROM courses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Self::row_to_course(&r)))
    }

    pub async fn list_for_teacher(&self, teacher_id: &str) -> Result<Vec<Course>> {
        let rows = sqlx::query(
            r#"
            SELECT id, teacher_id, title, description, created_at
            FROM courses
            WHERE teacher_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_course).collect())
    }

    /// Deletes the course row only; children are removed by `cleanup`.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_course(row: &SqliteRow) -> Course {
        Course {
            id: row.get("id"),
            teacher_id: row.get("teacher_id"),
            title: row.get("title"),
            description: row.get("description"),
            created_at: row.get("created_at"),
        }
    }
}
