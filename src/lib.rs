// src/lib.rs

pub mod analytics;
pub mod api;
pub mod cleanup;
pub mod config;
pub mod course;
pub mod db;
pub mod error;
pub mod lesson;
pub mod llm;
pub mod material;
pub mod quiz;
pub mod session;
pub mod state;
pub mod student;

pub use error::{OakError, Result};
