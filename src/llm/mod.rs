//! Text generation collaborator
//!
//! Handlers talk to the hosted model only through [`TextGenerator`], so the
//! HTTP client can be swapped for a scripted one in tests.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod groq;
pub use groq::GroqClient;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Which configured model a request should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelTier {
    #[default]
    Standard,
    Fast,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Sent as a leading system message when non-empty
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub tier: ModelTier,
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            ..Self::default()
        }
    }

    pub fn user_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::user(content));
        self
    }

    pub fn tier(mut self, tier: ModelTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Full message list as sent over the wire
    pub fn wire_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if !self.system_prompt.trim().is_empty() {
            messages.push(ChatMessage {
                role: Role::System,
                content: self.system_prompt.clone(),
            });
        }
        messages.extend(self.messages.iter().cloned());
        messages
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a completion; failures come back as `GenerationFailure`
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}
