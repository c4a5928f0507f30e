// src/session/attempts.rs
//! Append-only multiple-choice attempt log. Understanding levels are derived
//! from these rows on every read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::types::OptionKey;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub session_id: String,
    pub student_id: String,
    pub lesson_id: String,
    pub concept: String,
    pub question_index: i64,
    pub selected_option: String,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to log one submission.
#[derive(Debug, Clone)]
pub struct NewAttempt<'a> {
    pub session_id: &'a str,
    pub student_id: &'a str,
    pub lesson_id: &'a str,
    pub concept: &'a str,
    pub question_index: usize,
    pub selected: OptionKey,
    pub is_correct: bool,
}

#[derive(Clone)]
pub struct AttemptStore {
    pool: SqlitePool,
}

impl AttemptStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, attempt: NewAttempt<'_>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO multiple_choice_attempts (
                session_id, student_id, lesson_id, concept,
                question_index, selected_option, is_correct, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(attempt.session_id)
        .bind(attempt.student_id)
        .bind(attempt.lesson_id)
        .bind(attempt.concept)
        .bind(attempt.question_index as i64)
        .bind(attempt.selected.as_str())
        .bind(attempt.is_correct)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Attempts for a lesson, optionally narrowed to one student, oldest first.
    pub async fn list_for_lesson(&self, lesson_id: &str, student_id: Option<&str>) -> Result<Vec<Attempt>> {
        let rows = match student_id {
            Some(student_id) => {
                sqlx::query(
                    r#"
                    SELECT * FROM multiple_choice_attempts
                    WHERE lesson_id = ? AND student_id = ?
                    ORDER BY created_at, id
                    "#,
                )
                .bind(lesson_id)
                .bind(student_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT * FROM multiple_choice_attempts
                    WHERE lesson_id = ?
                    ORDER BY created_at, id
                    "#,
                )
                .bind(lesson_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(Self::row_to_attempt).collect())
    }

    pub async fn list_for_session(&self, session_id: &str) -> Result<Vec<Attempt>> {
        let rows = sqlx::query(
            "SELECT * FROM multiple_choice_attempts WHERE session_id = ? ORDER BY created_at, id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_attempt).collect())
    }

    pub async fn delete_for_session(&self, session_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM multiple_choice_attempts WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    fn row_to_attempt(row: &SqliteRow) -> Attempt {
        Attempt {
            id: row.get("id"),
            session_id: row.get("session_id"),
            student_id: row.get("student_id"),
            lesson_id: row.get("lesson_id"),
            concept: row.get("concept"),
            question_index: row.get("question_index"),
            selected_option: row.get("selected_option"),
            is_correct: row.get("is_correct"),
            created_at: row.get("created_at"),
        }
    }
}
