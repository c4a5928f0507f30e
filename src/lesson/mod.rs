// src/lesson/mod.rs
pub mod store;
pub mod types;

pub use store::LessonStore;
pub use types::{CreateLessonRequest, KeyConcept, Lesson, UpdateLessonRequest};
