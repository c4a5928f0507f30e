// src/db/migration.rs
//! Creates the OakTree schema. Safe to call at every startup (idempotent).
//!
//! Parent/child relations are declared with REFERENCES but without
//! ON DELETE CASCADE: cascading deletes are performed by `cleanup`.

use anyhow::Result;
use sqlx::{Executor, SqlitePool};

const CREATE_STUDENTS: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    email TEXT,
    created_at DATETIME NOT NULL
);
"#;

const CREATE_COURSES: &str = r#"
CREATE TABLE IF NOT EXISTS courses (
    id TEXT PRIMARY KEY NOT NULL,
    teacher_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    created_at DATETIME NOT NULL
);
"#;

const CREATE_LESSONS: &str = r#"
CREATE TABLE IF NOT EXISTS lessons (
    id TEXT PRIMARY KEY NOT NULL,
    course_id TEXT NOT NULL REFERENCES courses(id),
    week_number INTEGER NOT NULL,
    lesson_number INTEGER NOT NULL,
    topic TEXT NOT NULL,
    ai_summary TEXT,
    key_concepts TEXT,
    pre_class_reading TEXT,
    created_at DATETIME NOT NULL
);
"#;

const CREATE_MATERIALS: &str = r#"
CREATE TABLE IF NOT EXISTS materials (
    id TEXT PRIMARY KEY NOT NULL,
    lesson_id TEXT NOT NULL REFERENCES lessons(id),
    title TEXT NOT NULL,
    file_name TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    content_text TEXT,
    summary TEXT,
    key_concepts TEXT,
    created_at DATETIME NOT NULL
);
"#;

/// `session_state` holds the live quiz progression; `analysis` holds the
/// end-of-session report. `version` backs compare-and-swap state writes.
const CREATE_CHAT_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS chat_sessions (
    id TEXT PRIMARY KEY NOT NULL,
    student_id TEXT NOT NULL REFERENCES students(id),
    lesson_id TEXT NOT NULL REFERENCES lessons(id),
    started_at DATETIME NOT NULL,
    ended_at DATETIME,
    status TEXT NOT NULL CHECK (status IN ('active', 'completed')),
    understanding_level INTEGER,
    strengths TEXT,
    misunderstandings TEXT,
    session_state TEXT,
    analysis TEXT,
    version INTEGER NOT NULL DEFAULT 0
);
"#;

/// At most one active session per (student, lesson).
const CREATE_ACTIVE_SESSION_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_chat_sessions_one_active
    ON chat_sessions(student_id, lesson_id)
    WHERE status = 'active';
"#;

const CREATE_CHAT_MESSAGES: &str = r#"
CREATE TABLE IF NOT EXISTS chat_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES chat_sessions(id),
    speaker TEXT NOT NULL CHECK (speaker IN ('tutor', 'student', 'grader')),
    kind TEXT NOT NULL,
    body TEXT NOT NULL,
    is_terminal BOOLEAN NOT NULL DEFAULT 0,
    timestamp DATETIME NOT NULL
);
"#;

const CREATE_MULTIPLE_CHOICE_ATTEMPTS: &str = r#"
CREATE TABLE IF NOT EXISTS multiple_choice_attempts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES chat_sessions(id),
    student_id TEXT NOT NULL,
    lesson_id TEXT NOT NULL,
    concept TEXT NOT NULL,
    question_index INTEGER NOT NULL,
    selected_option TEXT NOT NULL,
    is_correct BOOLEAN NOT NULL,
    created_at DATETIME NOT NULL
);
"#;

const CREATE_CONCEPT_PROGRESS: &str = r#"
CREATE TABLE IF NOT EXISTS concept_progress (
    session_id TEXT NOT NULL REFERENCES chat_sessions(id),
    concept TEXT NOT NULL,
    status TEXT NOT NULL,
    updated_at DATETIME NOT NULL,
    PRIMARY KEY (session_id, concept)
);
"#;

const CREATE_DYNAMIC_HINTS: &str = r#"
CREATE TABLE IF NOT EXISTS dynamic_hints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES chat_sessions(id),
    concept TEXT NOT NULL,
    phase TEXT NOT NULL,
    hint TEXT NOT NULL,
    created_at DATETIME NOT NULL
);
"#;

const CREATE_INDICES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_courses_teacher ON courses(teacher_id);
CREATE INDEX IF NOT EXISTS idx_lessons_course ON lessons(course_id);
CREATE INDEX IF NOT EXISTS idx_materials_lesson ON materials(lesson_id);
CREATE INDEX IF NOT EXISTS idx_chat_sessions_lesson ON chat_sessions(lesson_id);
CREATE INDEX IF NOT EXISTS idx_chat_sessions_student ON chat_sessions(student_id, lesson_id);
CREATE INDEX IF NOT EXISTS idx_chat_messages_session ON chat_messages(session_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_attempts_lesson ON multiple_choice_attempts(lesson_id, student_id);
CREATE INDEX IF NOT EXISTS idx_attempts_session ON multiple_choice_attempts(session_id);
CREATE INDEX IF NOT EXISTS idx_dynamic_hints_session ON dynamic_hints(session_id);
"#;

/// Runs all required migrations for the SQLite backend.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    pool.execute(CREATE_STUDENTS).await?;
    pool.execute(CREATE_COURSES).await?;
    pool.execute(CREATE_LESSONS).await?;
    pool.execute(CREATE_MATERIALS).await?;

    pool.execute(CREATE_CHAT_SESSIONS).await?;
    pool.execute(CREATE_ACTIVE_SESSION_INDEX).await?;
    pool.execute(CREATE_CHAT_MESSAGES).await?;

    pool.execute(CREATE_MULTIPLE_CHOICE_ATTEMPTS).await?;
    pool.execute(CREATE_CONCEPT_PROGRESS).await?;
    pool.execute(CREATE_DYNAMIC_HINTS).await?;

    pool.execute(CREATE_INDICES).await?;

    Ok(())
}
