// src/session/store.rs

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::state::{
    decode_analysis, decode_list, decode_state, decode_status, encode_analysis, encode_list,
    encode_state,
};
use super::types::{AnalysisReport, ChatSession, SessionState, SessionStatus};
use crate::error::{is_unique_violation, OakError, Result};

const SESSION_COLUMNS: &str = "id, student_id, lesson_id, started_at, ended_at, status, \
                               understanding_level, strengths, misunderstandings, \
                               session_state, analysis, version";

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The active session for (student, lesson), if any.
    pub async fn find_active(&self, student_id: &str, lesson_id: &str) -> Result<Option<ChatSession>> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions \
             WHERE student_id = ? AND lesson_id = ? AND status = 'active'"
        ))
        .bind(student_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Self::row_to_session(&r)))
    }

    /// Most recently started session for (student, lesson), active or completed.
    pub async fn find_latest(&self, student_id: &str, lesson_id: &str) -> Result<Option<ChatSession>> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions \
             WHERE student_id = ? AND lesson_id = ? \
             ORDER BY started_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(student_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Self::row_to_session(&r)))
    }

    pub async fn get(&self, id: &str) -> Result<Option<ChatSession>> {
        let row = sqlx::query(&format!("SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Self::row_to_session(&r)))
    }

    /// Opens a new active session. A concurrent start that already created one
    /// for the same pair trips the partial unique index and becomes a Conflict.
    pub async fn create(&self, student_id: &str, lesson_id: &str) -> Result<ChatSession> {
        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            lesson_id: lesson_id.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            status: SessionStatus::Active,
            understanding_level: None,
            strengths: None,
            misunderstandings: None,
            state: None,
            analysis: None,
            version: 0,
        };

        sqlx::query(
            r#"
            INSERT INTO chat_sessions (id, student_id, lesson_id, started_at, status, version)
            VALUES (?, ?, ?, ?, 'active', 0)
            "#,
        )
        .bind(&session.id)
        .bind(&session.student_id)
        .bind(&session.lesson_id)
        .bind(session.started_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                OakError::Conflict(format!(
                    "student {student_id} already has an active session for lesson {lesson_id}"
                ))
            } else {
                e.into()
            }
        })?;

        debug!("Created session {} for student {}", session.id, student_id);
        Ok(session)
    }

    /// Compare-and-swap write of the quiz state. Returns the new version.
    pub async fn save_state(&self, id: &str, state: &SessionState, expected_version: i64) -> Result<i64> {
        let result = sqlx::query(
            r#"
            UPDATE chat_sessions
            SET session_state = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(encode_state(state)?)
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Self::check_swapped(id, result.rows_affected())?;
        Ok(expected_version + 1)
    }

    /// Compare-and-swap write of the final state that also closes the session.
    pub async fn finish(
        &self,
        id: &str,
        state: &SessionState,
        expected_version: i64,
        understanding_level: i64,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            UPDATE chat_sessions
            SET session_state = ?, status = 'completed', ended_at = ?,
                understanding_level = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(encode_state(state)?)
        .bind(Utc::now())
        .bind(understanding_level)
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Self::check_swapped(id, result.rows_affected())?;
        Ok(expected_version + 1)
    }

    /// Rewinds a session to its first question and reopens it.
    pub async fn restart(&self, id: &str, state: &SessionState, expected_version: i64) -> Result<i64> {
        let result = sqlx::query(
            r#"
            UPDATE chat_sessions
            SET session_state = ?, status = 'active', started_at = ?, ended_at = NULL,
                understanding_level = NULL, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(encode_state(state)?)
        .bind(Utc::now())
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                OakError::Conflict(format!("another session is already active alongside {id}"))
            } else {
                e.into()
            }
        })?;

        Self::check_swapped(id, result.rows_affected())?;
        Ok(expected_version + 1)
    }

    /// Marks one session completed, leaving its data in place.
    pub async fn complete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE chat_sessions
            SET status = 'completed', ended_at = ?, version = version + 1
            WHERE id = ? AND status = 'active'
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Archives every active session of (student, lesson). Returns how many were closed.
    pub async fn complete_active(&self, student_id: &str, lesson_id: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE chat_sessions
            SET status = 'completed', ended_at = ?, version = version + 1
            WHERE student_id = ? AND lesson_id = ? AND status = 'active'
            "#,
        )
        .bind(Utc::now())
        .bind(student_id)
        .bind(lesson_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Stores the end-of-session analysis and closes the session.
    pub async fn save_analysis(&self, id: &str, report: &AnalysisReport) -> Result<()> {
        let strengths = encode_list(Some(report.strengths.as_slice()))?;
        let misunderstandings = encode_list(Some(report.misunderstandings.as_slice()))?;

        sqlx::query(
            r#"
            UPDATE chat_sessions
            SET analysis = ?, understanding_level = ?, strengths = ?, misunderstandings = ?,
                status = 'completed', ended_at = COALESCE(ended_at, ?), version = version + 1
            WHERE id = ?
            "#,
        )
        .bind(encode_analysis(report)?)
        .bind(i64::from(report.understanding_level))
        .bind(strengths)
        .bind(misunderstandings)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All sessions of a lesson, oldest first.
    pub async fn list_for_lesson(&self, lesson_id: &str) -> Result<Vec<ChatSession>> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE lesson_id = ? ORDER BY started_at"
        ))
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_session).collect())
    }

    /// All sessions of a student, newest first.
    pub async fn list_for_student(&self, student_id: &str) -> Result<Vec<ChatSession>> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE student_id = ? \
             ORDER BY started_at DESC, rowid DESC"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_session).collect())
    }

    pub async fn ids_for_lesson(&self, lesson_id: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT id FROM chat_sessions WHERE lesson_id = ?")
            .bind(lesson_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get("id")).collect())
    }

    pub async fn delete_for_lesson(&self, lesson_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE lesson_id = ?")
            .bind(lesson_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    fn check_swapped(id: &str, rows_affected: u64) -> Result<()> {
        if rows_affected == 0 {
            return Err(OakError::Conflict(format!(
                "session {id} was modified concurrently, reload and retry"
            )));
        }
        Ok(())
    }

    fn row_to_session(row: &SqliteRow) -> ChatSession {
        let id: String = row.get("id");
        let status: String = row.get("status");
        let state_raw: Option<String> = row.get("session_state");
        let analysis_raw: Option<String> = row.get("analysis");
        let strengths: Option<String> = row.get("strengths");
        let misunderstandings: Option<String> = row.get("misunderstandings");

        ChatSession {
            state: decode_state(&id, state_raw.as_deref()),
            analysis: decode_analysis(&id, analysis_raw.as_deref()),
            strengths: decode_list(strengths.as_deref()),
            misunderstandings: decode_list(misunderstandings.as_deref()),
            student_id: row.get("student_id"),
            lesson_id: row.get("lesson_id"),
            started_at: row.get("started_at"),
            ended_at: row.get("ended_at"),
            status: decode_status(&id, &status),
            understanding_level: row.get("understanding_level"),
            version: row.get("version"),
            id,
        }
    }
}
