// src/session/progress.rs
//! Auxiliary per-session rows: concept progress and the hints handed out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use super::types::Phase;
use crate::error::Result;

/// Where a student stands on one concept inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptStatus {
    MultipleChoice,
    Example,
    Completed,
}

impl ConceptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptStatus::MultipleChoice => "multiple_choice",
            ConceptStatus::Example => "example",
            ConceptStatus::Completed => "completed",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "example" => ConceptStatus::Example,
            "completed" => ConceptStatus::Completed,
            _ => ConceptStatus::MultipleChoice,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptProgress {
    pub session_id: String,
    pub concept: String,
    pub status: ConceptStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicHint {
    pub id: i64,
    pub session_id: String,
    pub concept: String,
    pub phase: String,
    pub hint: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ProgressStore {
    pool: SqlitePool,
}

impl ProgressStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert_concept(&self, session_id: &str, concept: &str, status: ConceptStatus) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO concept_progress (session_id, concept, status, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(session_id, concept)
            DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(concept)
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_concepts(&self, session_id: &str) -> Result<Vec<ConceptProgress>> {
        let rows = sqlx::query(
            "SELECT session_id, concept, status, updated_at FROM concept_progress \
             WHERE session_id = ? ORDER BY updated_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let status: String = row.get("status");
                ConceptProgress {
                    session_id: row.get("session_id"),
                    concept: row.get("concept"),
                    status: ConceptStatus::parse(&status),
                    updated_at: row.get("updated_at"),
                }
            })
            .collect())
    }

    pub async fn record_hint(&self, session_id: &str, concept: &str, phase: Phase, hint: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO dynamic_hints (session_id, concept, phase, hint, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(session_id)
        .bind(concept)
        .bind(phase.as_str())
        .bind(hint)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_hints(&self, session_id: &str) -> Result<Vec<DynamicHint>> {
        let rows = sqlx::query(
            "SELECT id, session_id, concept, phase, hint, created_at FROM dynamic_hints \
             WHERE session_id = ? ORDER BY created_at, id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| DynamicHint {
                id: row.get("id"),
                session_id: row.get("session_id"),
                concept: row.get("concept"),
                phase: row.get("phase"),
                hint: row.get("hint"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    pub async fn delete_concepts_for_session(&self, session_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM concept_progress WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_hints_for_session(&self, session_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM dynamic_hints WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
