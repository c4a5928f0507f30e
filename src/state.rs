// src/state.rs
// Shared application state handed to every HTTP handler

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::analytics::{TeacherDashboard, UnderstandingService};
use crate::cleanup::CascadeCleaner;
use crate::config::OakConfig;
use crate::course::CourseStore;
use crate::lesson::LessonStore;
use crate::llm::{LlmProvider, OpenAiCompatProvider};
use crate::material::{FileStorage, MaterialService, MaterialStore, MaterialSummarizer};
use crate::quiz::QuizService;
use crate::session::{AttemptStore, MessageStore, ProgressStore, SessionStore};
use crate::student::StudentStore;

#[derive(Clone)]
pub struct AppState {
    // -------- Storage --------
    pub pool: SqlitePool,
    pub students: StudentStore,
    pub courses: CourseStore,
    pub lessons: LessonStore,
    pub materials: MaterialStore,
    pub storage: FileStorage,

    // -------- LLM --------
    pub llm: Arc<dyn LlmProvider>,

    // -------- Services --------
    pub material_service: MaterialService,
    pub quiz: QuizService,
    pub understanding: UnderstandingService,
    pub dashboard: TeacherDashboard,
    pub cleaner: CascadeCleaner,

    // -------- Settings --------
    pub teacher_id: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        storage: FileStorage,
        llm: Arc<dyn LlmProvider>,
        teacher_id: impl Into<String>,
        max_upload_bytes: usize,
    ) -> Self {
        let students = StudentStore::new(pool.clone());
        let courses = CourseStore::new(pool.clone());
        let lessons = LessonStore::new(pool.clone());
        let materials = MaterialStore::new(pool.clone());
        let sessions = SessionStore::new(pool.clone());
        let messages = MessageStore::new(pool.clone());
        let attempts = AttemptStore::new(pool.clone());
        let progress = ProgressStore::new(pool.clone());

        let material_service = MaterialService::new(
            materials.clone(),
            lessons.clone(),
            storage.clone(),
            MaterialSummarizer::new(llm.clone()),
        );
        let quiz = QuizService::new(pool.clone(), llm.clone());
        let understanding = UnderstandingService::new(lessons.clone(), attempts.clone());
        let dashboard = TeacherDashboard::new(
            courses.clone(),
            lessons.clone(),
            sessions.clone(),
            students.clone(),
            attempts.clone(),
            messages.clone(),
        );
        let cleaner = CascadeCleaner::new(
            courses.clone(),
            lessons.clone(),
            materials.clone(),
            storage.clone(),
            sessions,
            messages,
            attempts,
            progress,
        );

        Self {
            pool,
            students,
            courses,
            lessons,
            materials,
            storage,
            llm,
            material_service,
            quiz,
            understanding,
            dashboard,
            cleaner,
            teacher_id: teacher_id.into(),
            max_upload_bytes,
        }
    }

    /// State wired to the configured OpenAI-compatible endpoint.
    pub fn from_config(pool: SqlitePool, config: &OakConfig) -> Self {
        Self::new(
            pool,
            FileStorage::new(&config.storage_dir),
            Arc::new(OpenAiCompatProvider::from_config(config)),
            config.teacher_id.clone(),
            config.max_upload_bytes,
        )
    }
}
