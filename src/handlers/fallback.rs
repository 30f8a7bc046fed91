//! Fallback conversational agent for unclear or unsupported requests

use crate::handlers::{HandlerMemory, TopicHandler};
use crate::llm::{GenerationRequest, ModelTier, TextGenerator};
use crate::memory::ChatSession;
use crate::models::Route;
use crate::prompts;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub struct FallbackHandler {
    generator: Arc<dyn TextGenerator>,
    memory: HandlerMemory,
}

impl FallbackHandler {
    pub fn new(generator: Arc<dyn TextGenerator>, memory: HandlerMemory) -> Self {
        Self { generator, memory }
    }
}

#[async_trait]
impl TopicHandler for FallbackHandler {
    fn route(&self) -> Route {
        Route::Fallback
    }

    fn memory(&self) -> &HandlerMemory {
        &self.memory
    }

    async fn answer(&self, query: &str, session: &ChatSession) -> Result<String> {
        let system_prompt =
            prompts::fallback_system(session.format_summary(), &session.format_history());

        self.generator
            .generate(
                GenerationRequest::new(system_prompt)
                    .user_message(query)
                    .tier(ModelTier::Standard),
            )
            .await
    }
}
