//! Topic handlers
//!
//! Each handler turns `(query, session)` into an answer: retrieve context,
//! generate, then record the exchange in the topic session. Memory handling
//! lives here once instead of in every handler.

use crate::error::ChatbotError;
use crate::memory::{ChatSession, MemoryManager, Summarizer, EMPTY_SENTINEL};
use crate::models::Route;
use crate::retrieval::Retriever;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod fallback;
pub mod faq;
pub mod general_qa;
pub mod sql;

pub use fallback::FallbackHandler;
pub use faq::FaqHandler;
pub use general_qa::GeneralQaHandler;
pub use sql::SqlHandler;

/// Memory policy plus the summarizer that feeds it
#[derive(Clone)]
pub struct HandlerMemory {
    manager: MemoryManager,
    summarizer: Arc<dyn Summarizer>,
}

impl HandlerMemory {
    pub fn new(manager: MemoryManager, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            manager,
            summarizer,
        }
    }

    pub fn manager(&self) -> &MemoryManager {
        &self.manager
    }

    /// Record the exchange and compact if due.
    ///
    /// A failed compaction is logged and retried on the next exchange.
    pub async fn remember(&self, route: Route, session: &mut ChatSession, query: &str, answer: &str) {
        self.manager.record_exchange(session, query, answer);

        if let Err(e) = self
            .manager
            .maybe_compact(session, self.summarizer.as_ref())
            .await
        {
            warn!(
                %route,
                turns = session.turn_count(),
                "Compaction failed, keeping full window: {}",
                e
            );
        }
    }
}

#[async_trait]
pub trait TopicHandler: Send + Sync {
    fn route(&self) -> Route;

    fn memory(&self) -> &HandlerMemory;

    /// Produce an answer without touching the session
    async fn answer(&self, query: &str, session: &ChatSession) -> Result<String>;

    /// Answer, then record the exchange. On error the session is unchanged.
    async fn handle(&self, query: &str, session: &mut ChatSession) -> Result<String> {
        let answer = self.answer(query, session).await?;
        self.memory()
            .remember(self.route(), session, query, &answer)
            .await;
        Ok(answer)
    }
}

/// Answers of the top-k documents joined by a space
pub(crate) async fn retrieve_context(
    retriever: &dyn Retriever,
    query: &str,
    k: usize,
) -> Result<String> {
    let documents = retriever.search(query, k).await?;
    let answers: Vec<&str> = documents.iter().filter_map(|d| d.answer()).collect();

    debug!(documents = documents.len(), answers = answers.len(), "Retrieved context");

    if answers.is_empty() {
        return Err(ChatbotError::RetrievalEmpty);
    }

    Ok(answers.join(" "))
}

/// Turn an empty retrieval into the `None` context the prompts expect
pub(crate) fn empty_context(error: ChatbotError) -> Result<String> {
    match error {
        ChatbotError::RetrievalEmpty => Ok(EMPTY_SENTINEL.to_string()),
        other => Err(other),
    }
}
