// src/student/store.rs

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::types::Student;
use crate::error::Result;

#[derive(Clone)]
pub struct StudentStore {
    pool: SqlitePool,
}

impl StudentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, name: String, email: Option<String>) -> Result<Student> {
        let student = Student {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO students (id, name, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(&student.id)
            .bind(&student.name)
            .bind(&student.email)
            .bind(student.created_at)
            .execute(&self.pool)
            .await?;

        Ok(student)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Student>> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Self::row_to_student(&r)))
    }

    pub async fn list(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query("SELECT id, name, email, created_at FROM students ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(Self::row_to_student).collect())
    }

    fn row_to_student(row: &SqliteRow) -> Student {
        Student {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            created_at: row.get("created_at"),
        }
    }
}
