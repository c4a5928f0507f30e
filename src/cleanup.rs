// src/cleanup.rs
//! Cascading deletes for courses and lessons.
//!
//! Child rows and stored files are removed best-effort: a failed step is
//! logged, recorded in the report, and later steps still run. Parent rows
//! (materials, lessons, the course) are strict: their deletion fails the
//! whole operation, and a lesson is not deleted while its sessions remain.

use serde::Serialize;
use tracing::{info, warn};

use crate::course::CourseStore;
use crate::error::{OakError, Result};
use crate::lesson::LessonStore;
use crate::material::{FileStorage, MaterialStore};
use crate::session::{AttemptStore, MessageStore, ProgressStore, SessionStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub lessons_deleted: u64,
    pub sessions_deleted: u64,
    pub messages_deleted: u64,
    pub attempts_deleted: u64,
    pub materials_deleted: u64,
    pub files_deleted: u64,
    /// Best-effort steps that failed
    pub failed_steps: Vec<String>,
}

impl CleanupReport {
    fn merge(&mut self, other: CleanupReport) {
        self.lessons_deleted += other.lessons_deleted;
        self.sessions_deleted += other.sessions_deleted;
        self.messages_deleted += other.messages_deleted;
        self.attempts_deleted += other.attempts_deleted;
        self.materials_deleted += other.materials_deleted;
        self.files_deleted += other.files_deleted;
        self.failed_steps.extend(other.failed_steps);
    }

    fn note_failure(&mut self, step: String, err: &OakError) {
        warn!("Cleanup step '{}' failed: {}", step, err);
        self.failed_steps.push(step);
    }
}

#[derive(Clone)]
pub struct CascadeCleaner {
    courses: CourseStore,
    lessons: LessonStore,
    materials: MaterialStore,
    storage: FileStorage,
    sessions: SessionStore,
    messages: MessageStore,
    attempts: AttemptStore,
    progress: ProgressStore,
}

impl CascadeCleaner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        courses: CourseStore,
        lessons: LessonStore,
        materials: MaterialStore,
        storage: FileStorage,
        sessions: SessionStore,
        messages: MessageStore,
        attempts: AttemptStore,
        progress: ProgressStore,
    ) -> Self {
        Self {
            courses,
            lessons,
            materials,
            storage,
            sessions,
            messages,
            attempts,
            progress,
        }
    }

    pub async fn delete_course(&self, course_id: &str) -> Result<CleanupReport> {
        self.courses
            .get(course_id)
            .await?
            .ok_or_else(|| OakError::not_found("course"))?;

        let mut report = CleanupReport::default();
        for lesson in self.lessons.list_for_course(course_id).await? {
            report.merge(self.delete_lesson(&lesson.id).await?);
        }

        if !self.courses.delete(course_id).await? {
            return Err(OakError::not_found("course"));
        }
        info!(
            "Deleted course {} ({} lessons, {} sessions, {} materials)",
            course_id, report.lessons_deleted, report.sessions_deleted, report.materials_deleted
        );
        Ok(report)
    }

    pub async fn delete_lesson(&self, lesson_id: &str) -> Result<CleanupReport> {
        self.lessons
            .get(lesson_id)
            .await?
            .ok_or_else(|| OakError::not_found("lesson"))?;

        let mut report = CleanupReport::default();

        match self.sessions.ids_for_lesson(lesson_id).await {
            Ok(ids) => {
                for session_id in ids {
                    self.clear_session(&session_id, &mut report).await;
                }
            }
            Err(e) => report.note_failure(format!("list sessions of lesson {lesson_id}"), &e),
        }

        match self.sessions.delete_for_lesson(lesson_id).await {
            Ok(count) => report.sessions_deleted = count,
            Err(e) => {
                report.note_failure(format!("delete sessions of lesson {lesson_id}"), &e);
                return Err(OakError::Storage(format!(
                    "lesson {lesson_id} still has chat sessions, not deleting it"
                )));
            }
        }

        let materials = self.materials.list_for_lesson(lesson_id).await?;
        for material in &materials {
            match self.storage.delete(&material.file_name).await {
                Ok(()) => report.files_deleted += 1,
                Err(e) => report.note_failure(format!("delete file {}", material.file_name), &e),
            }
        }

        report.materials_deleted = self.materials.delete_for_lesson(lesson_id).await?;

        if !self.lessons.delete(lesson_id).await? {
            return Err(OakError::not_found("lesson"));
        }
        report.lessons_deleted = 1;

        info!(
            "Deleted lesson {} ({} sessions, {} materials, {} failed steps)",
            lesson_id,
            report.sessions_deleted,
            report.materials_deleted,
            report.failed_steps.len()
        );
        Ok(report)
    }

    async fn clear_session(&self, session_id: &str, report: &mut CleanupReport) {
        match self.messages.delete_for_session(session_id).await {
            Ok(count) => report.messages_deleted += count,
            Err(e) => report.note_failure(format!("delete messages of session {session_id}"), &e),
        }
        match self.attempts.delete_for_session(session_id).await {
            Ok(count) => report.attempts_deleted += count,
            Err(e) => report.note_failure(format!("delete attempts of session {session_id}"), &e),
        }
        if let Err(e) = self.progress.delete_concepts_for_session(session_id).await {
            report.note_failure(format!("delete concept progress of session {session_id}"), &e);
        }
        if let Err(e) = self.progress.delete_hints_for_session(session_id).await {
            report.note_failure(format!("delete hints of session {session_id}"), &e);
        }
    }
}
