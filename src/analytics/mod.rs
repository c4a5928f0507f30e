// src/analytics/mod.rs
pub mod dashboard;
pub mod understanding;

pub use dashboard::{StudentDrilldown, StudentLesson, TeacherDashboard};
pub use understanding::{
    concept_band3, session_band5, ConceptScore, ConceptUnderstanding, UnderstandingBand,
    UnderstandingService,
};
