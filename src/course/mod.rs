// src/course/mod.rs
pub mod store;
pub mod types;

pub use store::CourseStore;
pub use types::{Course, CreateCourseRequest};
