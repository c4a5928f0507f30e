// src/student/mod.rs
pub mod store;
pub mod types;

pub use store::StudentStore;
pub use types::{CreateStudentRequest, Student};
