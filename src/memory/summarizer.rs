//! Context Summarization
//!
//! Condenses the turns leaving the window into a short summary using the
//! generation collaborator.

use crate::error::ChatbotError;
use crate::llm::{GenerationRequest, ModelTier, TextGenerator};
use crate::models::{Speaker, Turn};
use crate::prompts;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Produces summary text for a run of turns
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, turns: &[Turn]) -> crate::Result<String>;
}

/// Summarizer backed by the chat model
pub struct LlmSummarizer {
    generator: Arc<dyn TextGenerator>,
}

impl LlmSummarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Format turns into readable text for summarization
    fn format_turns_for_summary(turns: &[Turn]) -> String {
        let mut text = String::new();

        for turn in turns {
            let speaker = match turn.speaker {
                Speaker::User => "User",
                Speaker::Assistant => "Assistant",
            };
            text.push_str(&format!("{}: {}\n", speaker, turn.text));
        }

        text
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, turns: &[Turn]) -> crate::Result<String> {
        if turns.is_empty() {
            return Err(ChatbotError::GenerationFailure(
                "Cannot summarize empty turn list".to_string(),
            ));
        }

        let prompt = prompts::summary(&Self::format_turns_for_summary(turns));
        let request = GenerationRequest::new("")
            .user_message(prompt)
            .tier(ModelTier::Standard);

        info!("Summarizing {} turns", turns.len());

        match self.generator.generate(request).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                warn!("Failed to summarize conversation: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    #[test]
    fn test_format_turns_for_summary() {
        let turns = vec![
            Turn::user("What is the refund time?"),
            Turn::assistant("Refunds take 5-7 business days."),
        ];

        let formatted = LlmSummarizer::format_turns_for_summary(&turns);
        assert!(formatted.contains("User: What is the refund time?"));
        assert!(formatted.contains("Assistant: Refunds"));
    }

    #[tokio::test]
    async fn test_summarize_sends_transcript() {
        let generator = Arc::new(ScriptedGenerator::new(["user wants a refund"]));
        let summarizer = LlmSummarizer::new(generator.clone());

        let summary = summarizer
            .summarize(&[Turn::user("refund please"), Turn::assistant("sure")])
            .await
            .unwrap();

        assert_eq!(summary, "user wants a refund");
        let request = generator.last_request().unwrap();
        assert!(request.messages[0].content.contains("User: refund please"));
    }

    #[tokio::test]
    async fn test_summarize_empty_is_error() {
        let generator = Arc::new(ScriptedGenerator::new(Vec::<String>::new()));
        let summarizer = LlmSummarizer::new(generator);
        assert!(summarizer.summarize(&[]).await.is_err());
    }
}
