//! FAQ handler: store policies, payments, orders, refunds

use crate::handlers::{empty_context, retrieve_context, HandlerMemory, TopicHandler};
use crate::llm::{GenerationRequest, ModelTier, TextGenerator};
use crate::memory::ChatSession;
use crate::models::Route;
use crate::prompts;
use crate::retrieval::Retriever;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub struct FaqHandler {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn TextGenerator>,
    memory: HandlerMemory,
    top_k: usize,
}

impl FaqHandler {
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
impl TopicHandler for FaqHandler {
    fn route(&self) -> Route {
        Route::Faq
    }

    fn memory(&self) -> &HandlerMemory {
        &self.memory
    }

    async fn answer(&self, query: &str, session: &ChatSession) -> Result<String> {
        let context = retrieve_context(self.retriever.as_ref(), query, self.top_k)
            .await
            .or_else(empty_context)?;

        let prompt = prompts::faq_answer(
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatbotError;
    use crate::memory::{MemoryConfig, MemoryManager};
    use crate::error::UNAVAILABLE_MESSAGE;
    use crate::models::QaRecord;
    use crate::retrieval::VectorCollection;
    use crate::testing::{
        FailingGenerator, FlakyEmbedder, ScriptedGenerator, StaticRetriever, StaticSummarizer,
    };

    fn memory() -> HandlerMemory {
        HandlerMemory::new(
            MemoryManager::new(MemoryConfig::default()),
            Arc::new(StaticSummarizer::new("summary")),
        )
    }

    #[tokio::test]
    async fn test_answer_uses_retrieved_context() {
        let retriever = Arc::new(StaticRetriever::with_answers(&[
            "Cash on delivery is available.",
            "UPI and cards are accepted.",
            "never used",
        ]));
        let generator = Arc::new(ScriptedGenerator::new(["Yes, you can pay cash."]));
        let handler = FaqHandler::new(retriever.clone(), generator.clone(), memory(), 2);
        let mut session = ChatSession::new();

        let answer = handler.handle("will you accept cash", &mut session).await.unwrap();

        assert_eq!(answer, "Yes, you can pay cash.");
        assert_eq!(retriever.requested_k(), vec![2]);

        let request = generator.last_request().unwrap();
        assert_eq!(request.tier, ModelTier::Fast);
        let prompt = &request.messages[0].content;
        assert!(prompt.contains("Cash on delivery is available. UPI and cards are accepted."));
        assert!(!prompt.contains("never used"));

        assert_eq!(session.turn_count(), 2);
        assert_eq!(session.format_history(), "user: will you accept cash\nassistant: Yes, you can pay cash.");
    }

    #[tokio::test]
    async fn test_no_context_asks_for_i_dont_know() {
        let generator = Arc::new(ScriptedGenerator::new(["I don't know."]));
        let handler = FaqHandler::new(Arc::new(StaticRetriever::empty()), generator.clone(), memory(), 2);
        let mut session = ChatSession::new();

        handler.handle("do you sell cars?", &mut session).await.unwrap();

        let prompt = generator.last_request().unwrap().messages[0].content.clone();
        assert!(prompt.contains("Context:\nNone"));
        assert!(prompt.contains("I don't know"));
    }

    #[tokio::test]
    async fn test_history_is_injected_on_next_turn() {
        let generator = Arc::new(ScriptedGenerator::new(["30 days.", "Yes."]));
        let handler = FaqHandler::new(
            Arc::new(StaticRetriever::with_answers(&["Returns within 30 days."])),
            generator.clone(),
            memory(),
            2,
        );
        let mut session = ChatSession::new();

        handler.handle("return window?", &mut session).await.unwrap();
        handler.handle("for shoes too?", &mut session).await.unwrap();

        let prompt = generator.last_request().unwrap().messages[0].content.clone();
        assert!(prompt.contains("user: return window?\nassistant: 30 days."));
        assert_eq!(session.turn_count(), 4);
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_session() {
        let handler = FaqHandler::new(
            Arc::new(StaticRetriever::with_answers(&["anything"])),
            Arc::new(FailingGenerator),
            memory(),
            2,
        );
        let mut session = ChatSession::new();

        let result = handler.handle("track my order", &mut session).await;
        assert!(matches!(result, Err(ChatbotError::GenerationFailure(_))));
        assert_eq!(session.turn_count(), 0);
    }

    #[tokio::test]
    async fn test_embedding_outage_is_not_answered_from_empty_context() {
        let collection = VectorCollection::new("faqs", Arc::new(FlakyEmbedder::failing(usize::MAX)));
        let ingest = collection
            .ingest(&[QaRecord {
                question: "Do you offer cash on delivery?".into(),
                answer: "Yes, up to Rs. 10,000.".into(),
            }])
            .await;
        assert!(ingest.is_err());

        let generator = Arc::new(ScriptedGenerator::new(["I don't know."]));
        let handler = FaqHandler::new(Arc::new(collection), generator.clone(), memory(), 2);
        let mut session = ChatSession::new();

        let err = handler
            .handle("do you offer cash on delivery?", &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatbotError::Retrieval(_)));
        assert_eq!(err.user_message(), UNAVAILABLE_MESSAGE);
        assert_eq!(generator.calls(), 0);
        assert_eq!(session.turn_count(), 0);
    }
}
