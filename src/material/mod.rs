// src/material/mod.rs
pub mod extract;
pub mod service;
pub mod storage;
pub mod store;
pub mod summarize;
pub mod types;

pub use service::MaterialService;
pub use storage::FileStorage;
pub use store::MaterialStore;
pub use summarize::MaterialSummarizer;
pub use types::{Material, SummaryOutcome};
