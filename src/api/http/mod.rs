// src/api/http/mod.rs

pub mod chat;
pub mod courses;
pub mod handlers;
pub mod materials;
pub mod router;
pub mod students;
pub mod understanding;

pub use router::http_router;
