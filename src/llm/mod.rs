// src/llm/mod.rs

pub mod json;
pub mod provider;

pub use json::extract_json_object;
pub use provider::{ChatMessage, LlmProvider, OpenAiCompatProvider, ProviderResponse};

use anyhow::Result;
use tracing::debug;

/// Single-prompt completion: `prompt` as the user turn, `system` as the system message.
pub async fn generate(provider: &dyn LlmProvider, prompt: &str, system: &str) -> Result<String> {
    debug!("{} generate: {} prompt chars", provider.name(), prompt.len());
    let response = provider
        .chat(vec![ChatMessage::user(prompt)], system.to_string())
        .await?;
    Ok(response.content)
}
