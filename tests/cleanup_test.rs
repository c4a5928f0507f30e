// tests/cleanup_test.rs
// Cascading course and lesson deletes

mod common;

use common::{add_lesson, count, seed, setup};
use oaktree::error::OakError;
use oaktree::quiz::AnswerType;
use sqlx::SqlitePool;

const CHILD_TABLES: &[&str] = &[
    "lessons",
    "materials",
    "chat_sessions",
    "chat_messages",
    "multiple_choice_attempts",
    "concept_progress",
    "dynamic_hints",
];

async fn total(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_delete_course_removes_everything_below_it() {
    let env = setup().await;
    let s = seed(&env, &["A", "B"]).await;
    let second = add_lesson(&env, &s.course.id, 2, &["C"]).await;

    let mut files = Vec::new();
    for lesson_id in [&s.lesson.id, &second.id] {
        let material = env
            .state
            .material_service
            .upload(lesson_id, "Notes".to_string(), "notes.txt", b"Cells divide.".to_vec())
            .await
            .unwrap();
        files.push(material.file_name);
    }

    let start = env.state.quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    let quiz = &env.state.quiz;
    quiz.submit_answer(&start.session_id, "a", AnswerType::MultipleChoice).await.unwrap();
    quiz.submit_answer(&start.session_id, "b", AnswerType::MultipleChoice).await.unwrap();

    for table in CHILD_TABLES {
        assert!(total(&env.pool, table).await > 0, "{table} should have rows before delete");
    }

    let report = env.state.cleaner.delete_course(&s.course.id).await.unwrap();
    assert_eq!(report.lessons_deleted, 2);
    assert_eq!(report.sessions_deleted, 1);
    assert_eq!(report.materials_deleted, 2);
    assert_eq!(report.files_deleted, 2);
    assert_eq!(report.attempts_deleted, 2);
    assert!(report.failed_steps.is_empty());

    for table in CHILD_TABLES {
        assert_eq!(total(&env.pool, table).await, 0, "{table} should be empty");
    }
    assert_eq!(count(&env.pool, "SELECT COUNT(*) FROM courses WHERE id = ?", &s.course.id).await, 0);
    for file in &files {
        assert!(!env.state.storage.exists(file).await);
    }

    // the student is not part of the course hierarchy
    assert!(env.state.students.get(&s.student.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_lesson_leaves_siblings() {
    let env = setup().await;
    let s = seed(&env, &["A"]).await;
    let sibling = add_lesson(&env, &s.course.id, 2, &["B"]).await;
    env.state.quiz.start_session(&s.student.id, &s.lesson.id).await.unwrap();
    env.llm.set_questions(Some(common::questions_json(&["B"])));
    let kept = env.state.quiz.start_session(&s.student.id, &sibling.id).await.unwrap();

    let report = env.state.cleaner.delete_lesson(&s.lesson.id).await.unwrap();
    assert_eq!(report.lessons_deleted, 1);
    assert_eq!(report.sessions_deleted, 1);

    assert!(env.state.lessons.get(&sibling.id).await.unwrap().is_some());
    let messages = env.state.quiz.messages(&kept.session_id).await.unwrap();
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_missing_file_is_best_effort() {
    let env = setup().await;
    let s = seed(&env, &["A"]).await;
    let material = env
        .state
        .material_service
        .upload(&s.lesson.id, "Notes".to_string(), "notes.txt", b"text".to_vec())
        .await
        .unwrap();
    env.state.storage.delete(&material.file_name).await.unwrap();

    let report = env.state.cleaner.delete_lesson(&s.lesson.id).await.unwrap();
    assert_eq!(report.files_deleted, 0);
    assert_eq!(report.materials_deleted, 1);
    assert_eq!(report.failed_steps.len(), 1);
    assert!(env.state.lessons.get(&s.lesson.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_unknown_course_or_lesson() {
    let env = setup().await;
    let err = env.state.cleaner.delete_course("missing").await.unwrap_err();
    assert!(matches!(err, OakError::NotFound(_)));
    let err = env.state.cleaner.delete_lesson("missing").await.unwrap_err();
    assert!(matches!(err, OakError::NotFound(_)));
}
