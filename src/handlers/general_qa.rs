//! General questions about the assistant and shopping help

use crate::handlers::{empty_context, retrieve_context, HandlerMemory, TopicHandler};
use crate::llm::{GenerationRequest, ModelTier, TextGenerator};
use crate::memory::ChatSession;
use crate::models::Route;
use crate::prompts;
use crate::retrieval::Retriever;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct GeneralQaHandler {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn TextGenerator>,
    memory: HandlerMemory,
    top_k: usize,
}

impl GeneralQaHandler {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn TextGenerator>,
        memory: HandlerMemory,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            generator,
            memory,
            top_k,
        }
    }
}

#[async_trait]
impl TopicHandler for GeneralQaHandler {
    fn route(&self) -> Route {
        Route::GeneralQa
    }

    fn memory(&self) -> &HandlerMemory {
        &self.memory
    }

    async fn answer(&self, query: &str, session: &ChatSession) -> Result<String> {
        let context = retrieve_context(self.retriever.as_ref(), query, self.top_k)
            .await
            .or_else(empty_context)?;

        info!(
            history_turns = session.turn_count(),
            "Answering general question"
        );

        let prompt = prompts::general_answer(
            query,
            &context,
            session.format_summary(),
            &session.format_history(),
        );

        self.generator
            .generate(
                GenerationRequest::new("")
                    .user_message(prompt)
                    .tier(ModelTier::Fast),
            )
            .await
    }
}
