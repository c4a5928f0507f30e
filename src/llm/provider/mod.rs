// src/llm/provider/mod.rs
// LLM provider trait and type definitions
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod openai;

pub use openai::OpenAiCompatProvider;

/// Message format for all providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Unified response from any provider
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: String,
    pub metadata: ProviderMetadata,
}

/// Metadata returned by provider
#[derive(Debug, Clone, Default)]
pub struct ProviderMetadata {
    pub model_version: String,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub latency_ms: i64,
    pub finish_reason: Option<String>,
}

/// Text-completion capability used for question generation, example grading,
/// session analysis and material summaries.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging/debugging
    fn name(&self) -> &'static str;

    /// Chat completion with a system message
    async fn chat(&self, messages: Vec<ChatMessage>, system: String) -> Result<ProviderResponse>;
}
