//! Groq chat-completions client
//!
//! Speaks the OpenAI-compatible `/chat/completions` protocol.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::LlmConfig;
use crate::error::ChatbotError;
use crate::llm::{ChatMessage, GenerationRequest, ModelTier, TextGenerator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Reusable Groq client (connection-pooled)
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    fast_model: String,
}

impl GroqClient {
    pub fn new(config: &LlmConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatbotError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            fast_model: config.fast_model.clone(),
        })
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Standard => &self.model,
            ModelTier::Fast => &self.fast_model,
        }
    }
}

#[async_trait]
impl TextGenerator for GroqClient {
    async fn generate(&self, request: GenerationRequest) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(ChatbotError::GenerationFailure(
                "GROQ_API_KEY not configured".to_string(),
            ));
        }

        let body = CompletionRequest {
            model: self.model_for(request.tier).to_string(),
            messages: request.wire_messages(),
            temperature: request.temperature,
        };

        info!(model = %body.model, messages = body.messages.len(), "Calling Groq API");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Groq API request failed: {}", e);
                if e.is_timeout() {
                    ChatbotError::GenerationFailure("Groq API timed out".to_string())
                } else {
                    ChatbotError::GenerationFailure(format!("Groq API error: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Groq API error response: {}", error_text);
            return Err(ChatbotError::GenerationFailure(format!(
                "Groq API returned {}",
                status
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Groq response: {}", e);
            ChatbotError::GenerationFailure(format!("Groq parse error: {}", e))
        })?;

        extract_answer(completion)
    }
}

fn extract_answer(completion: CompletionResponse) -> crate::Result<String> {
    let answer = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if answer.is_empty() {
        return Err(ChatbotError::GenerationFailure(
            "Empty response from Groq".to_string(),
        ));
    }

    Ok(answer)
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
