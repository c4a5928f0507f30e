// src/session/messages.rs
//! Structured chat messages. Role and terminality are stored columns,
//! never inferred from message text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::str::FromStr;
use tracing::warn;

use super::types::{AnswerOptions, OptionKey};
use crate::error::{OakError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Tutor,
    Student,
    Grader,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Tutor => "tutor",
            Speaker::Student => "student",
            Speaker::Grader => "grader",
        }
    }
}

impl FromStr for Speaker {
    type Err = OakError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tutor" => Ok(Speaker::Tutor),
            "student" => Ok(Speaker::Student),
            "grader" => Ok(Speaker::Grader),
            other => Err(OakError::invalid(format!("unknown speaker '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MessageBody {
    /// A question presented to the student
    MultipleChoice {
        message: String,
        options: AnswerOptions,
        concept: String,
        question_index: usize,
    },
    MultipleChoiceAnswer {
        selected: OptionKey,
        question_index: usize,
    },
    ExampleSubmission {
        content: String,
        question_index: usize,
    },
    Feedback {
        message: String,
        is_positive: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
    Text {
        message: String,
    },
}

impl MessageBody {
    pub fn kind(&self) -> &'static str {
        match self {
            MessageBody::MultipleChoice { .. } => "multiple_choice",
            MessageBody::MultipleChoiceAnswer { .. } => "multiple_choice_answer",
            MessageBody::ExampleSubmission { .. } => "example_submission",
            MessageBody::Feedback { .. } => "feedback",
            MessageBody::Text { .. } => "text",
        }
    }

    pub fn text(message: impl Into<String>) -> Self {
        MessageBody::Text {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub session_id: String,
    pub speaker: Speaker,
    pub body: MessageBody,
    pub is_terminal: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        session_id: &str,
        speaker: Speaker,
        body: &MessageBody,
        is_terminal: bool,
    ) -> Result<StoredMessage> {
        let timestamp = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO chat_messages (session_id, speaker, kind, body, is_terminal, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session_id)
        .bind(speaker.as_str())
        .bind(body.kind())
        .bind(serde_json::to_string(body)?)
        .bind(is_terminal)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(StoredMessage {
            id: result.last_insert_rowid(),
            session_id: session_id.to_string(),
            speaker,
            body: body.clone(),
            is_terminal,
            timestamp,
        })
    }

    /// Transcript of a session in write order.
    pub async fn list(&self, session_id: &str) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, speaker, body, is_terminal, timestamp
            FROM chat_messages
            WHERE session_id = ?
            ORDER BY timestamp, id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_message).collect())
    }

    pub async fn delete_for_session(&self, session_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    fn row_to_message(row: &SqliteRow) -> StoredMessage {
        let id: i64 = row.get("id");
        let speaker: String = row.get("speaker");
        let raw_body: String = row.get("body");

        let body = serde_json::from_str(&raw_body).unwrap_or_else(|e| {
            warn!("Message {} has unreadable body, showing as text: {}", id, e);
            MessageBody::text(raw_body.clone())
        });

        StoredMessage {
            id,
            session_id: row.get("session_id"),
            speaker: decode_speaker(id, &speaker),
            body,
            is_terminal: row.get("is_terminal"),
            timestamp: row.get("timestamp"),
        }
    }
}

fn decode_speaker(message_id: i64, raw: &str) -> Speaker {
    raw.parse().unwrap_or_else(|e| {
        warn!("Message {} has unreadable speaker, showing as tutor: {}", message_id, e);
        Speaker::Tutor
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_speaker_reads_as_tutor() {
        assert_eq!(decode_speaker(1, "grader"), Speaker::Grader);
        assert_eq!(decode_speaker(2, "sage"), Speaker::Tutor);
    }

    #[test]
    fn question_body_is_tagged() {
        let body = MessageBody::MultipleChoice {
            message: "Which one?".into(),
            options: AnswerOptions {
                a: "x".into(),
                b: "y".into(),
                c: "z".into(),
            },
            concept: "Osmosis".into(),
            question_index: 2,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["type"], "multiple_choice");
        assert_eq!(value["questionIndex"], 2);
        assert_eq!(value["options"]["c"], "z");
        assert_eq!(body.kind(), "multiple_choice");
    }

    #[test]
    fn feedback_reads_back() {
        let value = json!({"type": "feedback", "message": "Nice", "isPositive": true});
        let body: MessageBody = serde_json::from_value(value).unwrap();
        assert_eq!(
            body,
            MessageBody::Feedback {
                message: "Nice".into(),
                is_positive: true,
                hint: None
            }
        );
    }

    #[test]
    fn speaker_round_trip_through_column() {
        for speaker in [Speaker::Tutor, Speaker::Student, Speaker::Grader] {
            assert_eq!(speaker.as_str().parse::<Speaker>().unwrap(), speaker);
        }
        assert!("ai".parse::<Speaker>().is_err());
    }
}
