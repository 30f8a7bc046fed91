//! Shopping assistant turn handling
//!
//! Routes each query to a topic handler and converts every failure into a
//! reply the shopper can read. Conversation state is passed in explicitly;
//! the assistant itself holds no per-user state and can be shared.

use crate::config::{BotConfig, FaqDispatch};
use crate::error::ChatbotError;
use crate::handlers::{
    FallbackHandler, FaqHandler, GeneralQaHandler, HandlerMemory, SqlHandler, TopicHandler,
};
use crate::llm::{GroqClient, TextGenerator};
use crate::memory::{ChatSession, LlmSummarizer, MemoryManager, Summarizer};
use crate::models::{Reply, Route, Turn};
use crate::retrieval::{load_qa_records, EmbeddingProvider, OpenAiEmbeddings, VectorCollection};
use crate::routing::{IntentRouter, RouteDecision, UtteranceClassifier};
use crate::sql::SqliteProductStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const GREETING: &str =
    "👋 Hi! I'm your e-commerce assistant. Ask me about products, prices, offers, or comparisons.";

/// Display transcript length cap; memory sessions are bounded separately
pub const MAX_TRANSCRIPT_TURNS: usize = 200;

pub const GRATITUDE_REPLY: &str = "😊 You're welcome! Let me know if you need help shopping.";

/// All state for one conversation: display transcript plus a memory session
/// per topic
#[derive(Debug, Clone)]
pub struct Conversation {
    id: Uuid,
    created_at: DateTime<Utc>,
    transcript: Vec<Turn>,
    sessions: HashMap<Route, ChatSession>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            transcript: vec![Turn::assistant(GREETING)],
            sessions: HashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn session(&self, route: Route) -> Option<&ChatSession> {
        self.sessions.get(&route)
    }

    fn session_mut(&mut self, route: Route) -> &mut ChatSession {
        self.sessions.entry(route).or_default()
    }

    /// Back to a fresh greeting with no memory
    /// Append to the display transcript, dropping the oldest turns past
    /// [`MAX_TRANSCRIPT_TURNS`]
    fn push_transcript(&mut self, turn: Turn) {
        self.transcript.push(turn);
        if self.transcript.len() > MAX_TRANSCRIPT_TURNS {
            let excess = self.transcript.len() - MAX_TRANSCRIPT_TURNS;
            self.transcript.drain(..excess);
        }
    }

    pub fn reset(&mut self) {
        self.transcript = vec![Turn::assistant(GREETING)];
        self.sessions.clear();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// One handler per route
pub struct TopicHandlers {
    pub faq: Arc<dyn TopicHandler>,
    pub sql: Arc<dyn TopicHandler>,
    pub general_qa: Arc<dyn TopicHandler>,
    pub fallback: Arc<dyn TopicHandler>,
}

pub struct ShoppingAssistant {
    router: IntentRouter,
    handlers: TopicHandlers,
    faq_dispatch: FaqDispatch,
}

impl ShoppingAssistant {
    pub fn new(router: IntentRouter, handlers: TopicHandlers, faq_dispatch: FaqDispatch) -> Self {
        if faq_dispatch == FaqDispatch::Fallback {
            warn!("FAQ_DISPATCH=fallback: faq queries will be answered by the fallback agent");
        }

        Self {
            router,
            handlers,
            faq_dispatch,
        }
    }

    /// Wire up the hosted collaborators and ingest knowledge files
    pub async fn from_config(config: &BotConfig) -> crate::Result<Self> {
        let generator: Arc<dyn TextGenerator> = Arc::new(GroqClient::new(&config.llm)?);
        let summarizer: Arc<dyn Summarizer> = Arc::new(LlmSummarizer::new(generator.clone()));
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(OpenAiEmbeddings::new(&config.embeddings)?);

        let faqs = Arc::new(VectorCollection::new("faqs", embedder.clone()));
        ingest_file(&faqs, &config.faq_data_path).await;

        let general = Arc::new(VectorCollection::new("general_qa", embedder));
        ingest_file(&general, &config.general_qa_data_path).await;

        let products = Arc::new(SqliteProductStore::open(
            &config.product_db_url,
            config.sql_timeout,
        )?);

        let topic_memory =
            HandlerMemory::new(MemoryManager::new(config.topic_memory), summarizer.clone());
        let fallback_memory =
            HandlerMemory::new(MemoryManager::new(config.fallback_memory), summarizer);

        let handlers = TopicHandlers {
            faq: Arc::new(FaqHandler::new(
                faqs,
                generator.clone(),
                topic_memory.clone(),
                config.retrieval_top_k,
            )),
            sql: Arc::new(SqlHandler::new(
                products,
                generator.clone(),
                topic_memory.clone(),
                config.sql_row_limit,
            )),
            general_qa: Arc::new(GeneralQaHandler::new(
                general,
                generator.clone(),
                topic_memory,
                config.retrieval_top_k,
            )),
            fallback: Arc::new(FallbackHandler::new(generator, fallback_memory)),
        };

        let classifier = Arc::new(UtteranceClassifier::with_default_routes(
            config.router_threshold,
        ));

        info!("Shopping assistant initialized");
        Ok(Self::new(
            IntentRouter::new(classifier),
            handlers,
            config.faq_dispatch,
        ))
    }

    /// Answer one query; never fails. The exchange is appended to the
    /// conversation transcript.
    pub async fn respond(&self, conversation: &mut Conversation, query: &str) -> Reply {
        conversation.push_transcript(Turn::user(query));

        let reply = match self.try_respond(conversation, query).await {
            Ok(reply) => reply,
            Err(e) => {
                match &e {
                    ChatbotError::RoutingAmbiguous => {
                        info!(conversation_id = %conversation.id, "No route for query, asking to rephrase")
                    }
                    other => {
                        error!(conversation_id = %conversation.id, "Turn failed: {}", other)
                    }
                }
                Reply {
                    answer: e.user_message().to_string(),
                    route: None,
                }
            }
        };

        conversation.push_transcript(Turn::assistant(reply.answer.as_str()));
        reply
    }

    /// Answer one query, surfacing the typed failure
    pub async fn try_respond(
        &self,
        conversation: &mut Conversation,
        query: &str,
    ) -> crate::Result<Reply> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatbotError::RoutingAmbiguous);
        }

        match self.router.route(query).await? {
            RouteDecision::Gratitude => Ok(Reply {
                answer: GRATITUDE_REPLY.to_string(),
                route: None,
            }),
            RouteDecision::Clarify => Err(ChatbotError::RoutingAmbiguous),
            RouteDecision::Handle(route) => {
                let route = self.dispatch_target(route);
                let handler = self.handler_for(route);

                info!(conversation_id = %conversation.id, %route, "Dispatching query");
                let answer = handler.handle(query, conversation.session_mut(route)).await?;

                Ok(Reply {
                    answer,
                    route: Some(route),
                })
            }
        }
    }

    fn dispatch_target(&self, route: Route) -> Route {
        if route == Route::Faq && self.faq_dispatch == FaqDispatch::Fallback {
            warn!("faq route redirected to the fallback agent");
            return Route::Fallback;
        }
        route
    }

    fn handler_for(&self, route: Route) -> &dyn TopicHandler {
        match route {
            Route::Faq => self.handlers.faq.as_ref(),
            Route::Sql => self.handlers.sql.as_ref(),
            Route::GeneralQa => self.handlers.general_qa.as_ref(),
            Route::Fallback => self.handlers.fallback.as_ref(),
        }
    }
}

/// Load and ingest a knowledge file. A missing file leaves the collection
/// empty; an embedding failure is retried by the collection on first search.
async fn ingest_file(collection: &VectorCollection, path: &Path) {
    let records = match load_qa_records(path) {
        Ok(records) => records,
        Err(e) => {
            warn!(
                collection = collection.name(),
                path = %path.display(),
                "Knowledge file not loaded, answers will fall back to \"I don't know\": {}",
                e
            );
            return;
        }
    };

    if let Err(e) = collection.ingest(&records).await {
        warn!(collection = collection.name(), "Knowledge ingest deferred: {}", e);
    }
}
