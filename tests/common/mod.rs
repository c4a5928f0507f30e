// tests/common/mod.rs
// Shared setup for integration tests: in-memory database, scripted LLM,
// temporary storage directory.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use oaktree::course::Course;
use oaktree::lesson::{store::NewLesson, KeyConcept, Lesson};
use oaktree::llm::{ChatMessage, LlmProvider, ProviderResponse};
use oaktree::llm::provider::ProviderMetadata;
use oaktree::material::FileStorage;
use oaktree::state::AppState;
use oaktree::student::Student;

pub const TEACHER_ID: &str = "teacher-test";

/// Which collaborator a prompt was meant for, keyed off its system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Questions,
    Grade,
    Analysis,
    Summary,
}

fn classify(system: &str) -> CallKind {
    if system.contains("quizzes") {
        CallKind::Questions
    } else if system.contains("example of a concept") {
        CallKind::Grade
    } else if system.contains("education specialist") {
        CallKind::Analysis
    } else {
        CallKind::Summary
    }
}

/// LLM stand-in with canned replies and per-kind call counters.
/// A reply of `None` makes the call fail like an unreachable provider.
#[derive(Default)]
pub struct ScriptedProvider {
    questions: Mutex<Option<String>>,
    grades: Mutex<VecDeque<String>>,
    analysis: Mutex<Option<String>>,
    summary: Mutex<Option<String>>,
    calls: Mutex<HashMap<CallKind, usize>>,
}

impl ScriptedProvider {
    pub fn set_questions(&self, reply: Option<String>) {
        *self.questions.lock().unwrap() = reply;
    }

    /// Queue grading replies; once empty every example is judged correct.
    pub fn push_grade(&self, reply: impl Into<String>) {
        self.grades.lock().unwrap().push_back(reply.into());
    }

    pub fn set_analysis(&self, reply: Option<String>) {
        *self.analysis.lock().unwrap() = reply;
    }

    pub fn set_summary(&self, reply: Option<String>) {
        *self.summary.lock().unwrap() = reply;
    }

    pub fn calls(&self, kind: CallKind) -> usize {
        self.calls.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    fn reply(&self, kind: CallKind) -> Option<String> {
        match kind {
            CallKind::Questions => self.questions.lock().unwrap().clone(),
            CallKind::Grade => Some(
                self.grades
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| grade_json(true, "Great example!")),
            ),
            CallKind::Analysis => self.analysis.lock().unwrap().clone(),
            CallKind::Summary => self.summary.lock().unwrap().clone(),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, _messages: Vec<ChatMessage>, system: String) -> Result<ProviderResponse> {
        let kind = classify(&system);
        *self.calls.lock().unwrap().entry(kind).or_insert(0) += 1;

        let content = self
            .reply(kind)
            .ok_or_else(|| anyhow!("scripted provider has no reply for {:?}", kind))?;
        Ok(ProviderResponse {
            content,
            metadata: ProviderMetadata::default(),
        })
    }
}

/// One question per concept; the correct option is always `b`.
pub fn questions_json(concepts: &[&str]) -> String {
    let questions: Vec<_> = concepts
        .iter()
        .map(|concept| {
            json!({
                "concept": concept,
                "conceptDescription": format!("About {concept}"),
                "multipleChoiceQuestion": format!("Which statement describes {concept}?"),
                "options": {"a": "Wrong one", "b": format!("{concept} done right"), "c": "Wrong two"},
                "correctOption": "b",
                "correctExplanation": format!("Exactly, that is {concept}. Can you think of an example?"),
                "examplePrompt": format!("Give me an everyday example of {concept}."),
                "exampleHint": "Think about your kitchen."
            })
        })
        .collect();
    json!({ "questions": questions }).to_string()
}

pub fn grade_json(is_correct: bool, feedback: &str) -> String {
    json!({
        "isCorrect": is_correct,
        "feedback": feedback,
        "hint": if is_correct { "" } else { "Try something you can see." }
    })
    .to_string()
}

pub struct TestEnv {
    pub pool: SqlitePool,
    pub state: Arc<AppState>,
    pub llm: Arc<ScriptedProvider>,
    pub storage_dir: TempDir,
}

pub async fn setup() -> TestEnv {
    let pool = oaktree::db::connect_in_memory()
        .await
        .expect("in-memory database");
    let storage_dir = TempDir::new().expect("temp storage dir");
    let llm = Arc::new(ScriptedProvider::default());

    let state = Arc::new(AppState::new(
        pool.clone(),
        FileStorage::new(storage_dir.path()),
        llm.clone(),
        TEACHER_ID,
        1024 * 1024,
    ));

    TestEnv {
        pool,
        state,
        llm,
        storage_dir,
    }
}

pub struct Seeded {
    pub course: Course,
    pub lesson: Lesson,
    pub student: Student,
}

/// A course with one lesson on `concepts` and one student. The scripted
/// provider is primed with a matching question set.
pub async fn seed(env: &TestEnv, concepts: &[&str]) -> Seeded {
    let course = env
        .state
        .courses
        .create(TEACHER_ID, "Biology".to_string(), None)
        .await
        .expect("course");
    let lesson = add_lesson(env, &course.id, 1, concepts).await;
    let student = env
        .state
        .students
        .create("Ada".to_string(), Some("ada@example.com".to_string()))
        .await
        .expect("student");

    env.llm.set_questions(Some(questions_json(concepts)));
    Seeded {
        course,
        lesson,
        student,
    }
}

pub async fn add_lesson(env: &TestEnv, course_id: &str, number: i64, concepts: &[&str]) -> Lesson {
    env.state
        .lessons
        .create(NewLesson {
            course_id: course_id.to_string(),
            week_number: 1,
            lesson_number: number,
            topic: format!("Lesson {number}"),
            key_concepts: Some(concepts.iter().map(|c| KeyConcept::new(*c, "")).collect()),
            pre_class_reading: None,
        })
        .await
        .expect("lesson")
}

pub async fn count(pool: &SqlitePool, sql: &str, id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("count query")
}
