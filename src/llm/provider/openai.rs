// src/llm/provider/openai.rs
// OpenAI-compatible chat completions provider

use super::{ChatMessage, LlmProvider, ProviderMetadata, ProviderResponse};
use crate::config::OakConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    url: String,
    model: String,
    max_tokens: usize,
}

impl OpenAiCompatProvider {
    pub fn new(api_key: String, url: String, model: String, max_tokens: usize) -> Self {
        Self {
            client: Client::new(),
            api_key,
            url,
            model,
            max_tokens,
        }
    }

    pub fn from_config(config: &OakConfig) -> Self {
        Self::new(
            config.openai_api_key.clone(),
            config.chat_completions_url(),
            config.model.clone(),
            config.max_output_tokens,
        )
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, messages: Vec<ChatMessage>, system: String) -> Result<ProviderResponse> {
        let start = Instant::now();

        let mut api_messages = vec![json!({
            "role": "system",
            "content": system
        })];

        for msg in messages {
            api_messages.push(json!({
                "role": msg.role,
                "content": msg.content
            }));
        }

        let body = json!({
            "model": self.model,
            "messages": api_messages,
            "max_tokens": self.max_tokens,
        });

        debug!("Chat completion request: model={}", self.model);

        let mut request = self.client.post(&self.url).json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Chat completions API error {}: {}", status, error_text));
        }

        let raw_response = response.json::<Value>().await?;
        let latency_ms = start.elapsed().as_millis() as i64;

        let content = raw_response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("No content in chat completions response"))?
            .to_string();

        let usage = &raw_response["usage"];
        let metadata = ProviderMetadata {
            model_version: raw_response["model"]
                .as_str()
                .unwrap_or(&self.model)
                .to_string(),
            input_tokens: usage["prompt_tokens"].as_i64(),
            output_tokens: usage["completion_tokens"].as_i64(),
            total_tokens: usage["total_tokens"].as_i64(),
            latency_ms,
            finish_reason: raw_response["choices"][0]["finish_reason"]
                .as_str()
                .map(|s| s.to_string()),
        };

        debug!(
            "Chat completion finished in {}ms ({:?} tokens)",
            metadata.latency_ms, metadata.total_tokens
        );

        Ok(ProviderResponse { content, metadata })
    }
}
