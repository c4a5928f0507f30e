// src/analytics/dashboard.rs
//! Teacher-facing progress views and the student lesson list.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::understanding::{mean_band5, score_concepts, ConceptScore};
use crate::course::{Course, CourseStore};
use crate::error::{OakError, Result};
use crate::lesson::{Lesson, LessonStore};
use crate::quiz::transcript::{self, Transcript};
use crate::session::{
    AttemptStore, ChatSession, MessageStore, Progress, SessionStatus, SessionStore,
};
use crate::student::{Student, StudentStore};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub session_id: String,
    pub student_id: String,
    pub student_name: Option<String>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub progress: Progress,
    pub concepts: Vec<ConceptScore>,
    /// Rounded mean of the per-concept 5-band levels
    pub session_level: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub lesson_id: String,
    pub week_number: i64,
    pub lesson_number: i64,
    pub topic: String,
    pub chat_available: bool,
    pub sessions: Vec<SessionProgress>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_id: String,
    pub title: String,
    pub lessons: Vec<LessonProgress>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDrilldown {
    pub student: Student,
    pub lesson_id: String,
    pub session: Option<SessionProgress>,
    pub understanding_level: Option<i64>,
    pub transcript: Option<Transcript>,
}

/// One lesson as the student's lesson list shows it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentLesson {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub chat_available: bool,
    pub session_id: Option<String>,
    pub session_status: Option<SessionStatus>,
    pub progress: Option<Progress>,
}

#[derive(Clone)]
pub struct TeacherDashboard {
    courses: CourseStore,
    lessons: LessonStore,
    sessions: SessionStore,
    students: StudentStore,
    attempts: AttemptStore,
    messages: MessageStore,
}

impl TeacherDashboard {
    pub fn new(
        courses: CourseStore,
        lessons: LessonStore,
        sessions: SessionStore,
        students: StudentStore,
        attempts: AttemptStore,
        messages: MessageStore,
    ) -> Self {
        Self {
            courses,
            lessons,
            sessions,
            students,
            attempts,
            messages,
        }
    }

    /// Every session of the teacher's lessons, optionally narrowed to one
    /// course and/or lesson.
    pub async fn fleet_progress(
        &self,
        teacher_id: &str,
        course_id: Option<&str>,
        lesson_id: Option<&str>,
    ) -> Result<Vec<CourseProgress>> {
        let mut courses = self.courses.list_for_teacher(teacher_id).await?;
        if let Some(course_id) = course_id {
            courses.retain(|c| c.id == course_id);
            if courses.is_empty() {
                return Err(OakError::not_found("course"));
            }
        }

        let names: HashMap<String, String> = self
            .students
            .list()
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let mut result = Vec::with_capacity(courses.len());
        for course in courses {
            let mut lessons = self.lessons.list_for_course(&course.id).await?;
            if let Some(lesson_id) = lesson_id {
                lessons.retain(|l| l.id == lesson_id);
            }

            let mut lesson_views = Vec::with_capacity(lessons.len());
            for lesson in lessons {
                let mut sessions = Vec::new();
                for session in self.sessions.list_for_lesson(&lesson.id).await? {
                    let name = names.get(&session.student_id).cloned();
                    sessions.push(self.session_progress(&lesson, session, name).await?);
                }
                lesson_views.push(LessonProgress {
                    chat_available: lesson.is_chat_ready(),
                    lesson_id: lesson.id,
                    week_number: lesson.week_number,
                    lesson_number: lesson.lesson_number,
                    topic: lesson.topic,
                    sessions,
                });
            }

            result.push(CourseProgress {
                course_id: course.id,
                title: course.title,
                lessons: lesson_views,
            });
        }

        if lesson_id.is_some() {
            result.retain(|c| !c.lessons.is_empty());
        }
        Ok(result)
    }

    /// The student's latest session for a lesson with its transcript.
    pub async fn student_drilldown(&self, student_id: &str, lesson_id: &str) -> Result<StudentDrilldown> {
        let student = self
            .students
            .get(student_id)
            .await?
            .ok_or_else(|| OakError::not_found("student"))?;
        let lesson = self
            .lessons
            .get(lesson_id)
            .await?
            .ok_or_else(|| OakError::not_found("lesson"))?;

        let Some(session) = self.sessions.find_latest(student_id, lesson_id).await? else {
            return Ok(StudentDrilldown {
                student,
                lesson_id: lesson.id,
                session: None,
                understanding_level: None,
                transcript: None,
            });
        };

        let messages = self.messages.list(&session.id).await?;
        let transcript = transcript::render(&messages, session.state.as_ref());
        let understanding_level = session.understanding_level;
        let name = Some(student.name.clone());
        let progress = self.session_progress(&lesson, session, name).await?;

        Ok(StudentDrilldown {
            student,
            lesson_id: lesson.id,
            session: Some(progress),
            understanding_level,
            transcript: Some(transcript),
        })
    }

    /// Lessons with chat availability and the student's latest session state,
    /// for every course of the teacher or just `course_id`.
    pub async fn student_lessons(
        &self,
        teacher_id: &str,
        student_id: &str,
        course_id: Option<&str>,
    ) -> Result<Vec<StudentLesson>> {
        self.students
            .get(student_id)
            .await?
            .ok_or_else(|| OakError::not_found("student"))?;

        let courses: Vec<Course> = match course_id {
            Some(course_id) => vec![self
                .courses
                .get(course_id)
                .await?
                .ok_or_else(|| OakError::not_found("course"))?],
            None => self.courses.list_for_teacher(teacher_id).await?,
        };

        // newest first, so the first one seen per lesson is the latest
        let mut latest: HashMap<String, ChatSession> = HashMap::new();
        for session in self.sessions.list_for_student(student_id).await? {
            latest.entry(session.lesson_id.clone()).or_insert(session);
        }

        let mut result = Vec::new();
        for course in courses {
            for lesson in self.lessons.list_for_course(&course.id).await? {
                let session = latest.get(&lesson.id);
                result.push(StudentLesson {
                    chat_available: lesson.is_chat_ready(),
                    session_id: session.map(|s| s.id.clone()),
                    session_status: session.map(|s| s.status),
                    progress: session.and_then(|s| s.quiz_state()).map(|st| st.progress()),
                    lesson,
                });
            }
        }
        Ok(result)
    }

    async fn session_progress(
        &self,
        lesson: &Lesson,
        session: ChatSession,
        student_name: Option<String>,
    ) -> Result<SessionProgress> {
        let concepts: Vec<String> = match session.quiz_state() {
            Some(state) => state.questions.iter().map(|q| q.concept.clone()).collect(),
            None => lesson.concepts().iter().map(|c| c.concept.clone()).collect(),
        };
        let attempts = self.attempts.list_for_session(&session.id).await?;
        let scores = score_concepts(&concepts, &attempts);
        let levels: Vec<u8> = scores.iter().map(|s| s.band5).collect();

        Ok(SessionProgress {
            progress: session
                .quiz_state()
                .map(|s| s.progress())
                .unwrap_or(Progress::at(0, 0)),
            session_level: mean_band5(&levels),
            concepts: scores,
            session_id: session.id,
            student_id: session.student_id,
            student_name,
            status: session.status,
            started_at: session.started_at,
            ended_at: session.ended_at,
        })
    }
}
