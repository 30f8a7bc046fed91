//! Scripted collaborators for unit tests

use crate::assistant::{ShoppingAssistant, TopicHandlers};
use crate::config::FaqDispatch;
use crate::error::ChatbotError;
use crate::handlers::{FallbackHandler, FaqHandler, GeneralQaHandler, HandlerMemory, SqlHandler};
use crate::llm::{GenerationRequest, TextGenerator};
use crate::memory::{MemoryConfig, MemoryManager, Summarizer};
use crate::models::{RetrievedDocument, Turn};
use crate::retrieval::{EmbeddingProvider, Retriever};
use crate::routing::{IntentClassifier, IntentRouter, RouteMatch};
use crate::sql::{self, SqlExecutor, SqlRow};
use crate::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays canned completions in order and records every request
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChatbotError::GenerationFailure("script exhausted".to_string()))
    }
}

pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<String> {
        Err(ChatbotError::GenerationFailure("timed out".to_string()))
    }
}

pub struct StaticSummarizer {
    text: String,
    inputs: Mutex<Vec<usize>>,
}

impl StaticSummarizer {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    pub fn last_input_len(&self) -> usize {
        self.inputs.lock().unwrap().last().copied().unwrap_or(0)
    }
}

#[async_trait]
impl Summarizer for StaticSummarizer {
    async fn summarize(&self, turns: &[Turn]) -> Result<String> {
        self.inputs.lock().unwrap().push(turns.len());
        Ok(self.text.clone())
    }
}

pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(&self, _turns: &[Turn]) -> Result<String> {
        Err(ChatbotError::GenerationFailure("summary timed out".to_string()))
    }
}

/// Returns the same documents for every query
pub struct StaticRetriever {
    documents: Vec<RetrievedDocument>,
    requested_k: Mutex<Vec<usize>>,
}

impl StaticRetriever {
    pub fn with_answers(answers: &[&str]) -> Self {
        let documents = answers
            .iter()
            .map(|answer| RetrievedDocument {
                document: format!("question for {}", answer),
                metadata: HashMap::from([("answer".to_string(), answer.to_string())]),
            })
            .collect();

        Self {
            documents,
            requested_k: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_answers(&[])
    }

    pub fn requested_k(&self) -> Vec<usize> {
        self.requested_k.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        self.requested_k.lock().unwrap().push(k);
        Ok(self.documents.iter().take(k).cloned().collect())
    }
}

/// Validates like the real executor, then returns canned rows
pub struct StaticSqlExecutor {
    rows: Vec<SqlRow>,
    executed: Mutex<Vec<String>>,
}

impl StaticSqlExecutor {
    pub fn new(rows: Vec<SqlRow>) -> Self {
        Self {
            rows,
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for StaticSqlExecutor {
    async fn execute(&self, query: &str, limit: usize) -> Result<Vec<SqlRow>> {
        let statement = sql::ensure_read_only(query)?;
        self.executed.lock().unwrap().push(statement.to_string());
        Ok(self.rows.iter().take(limit).cloned().collect())
    }
}

/// Bag-of-words embedder: each token lights one hashed dimension
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    const DIMS: usize = 64;

    fn embed_text(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; Self::DIMS];
        for token in crate::routing::tokenize(text) {
            let bucket = token
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % Self::DIMS] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::embed_text(t)).collect())
    }
}

/// Fails the first `failures` calls with a retrieval outage, then embeds
/// like [`KeywordEmbedder`]
pub struct FlakyEmbedder {
    remaining_failures: Mutex<usize>,
}

impl FlakyEmbedder {
    pub fn failing(failures: usize) -> Self {
        Self {
            remaining_failures: Mutex::new(failures),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        {
            let mut remaining = self.remaining_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ChatbotError::Retrieval("embeddings returned 503".to_string()));
            }
        }
        KeywordEmbedder.embed(texts).await
    }
}

/// Answers after a delay and records how many calls overlapped
pub struct SlowGenerator {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowGenerator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok("done".to_string())
    }
}

pub struct StaticClassifier(pub Option<RouteMatch>);

impl StaticClassifier {
    pub fn named(name: &str) -> Self {
        Self(Some(RouteMatch {
            name: name.to_string(),
            score: 1.0,
        }))
    }
}

#[async_trait]
impl IntentClassifier for StaticClassifier {
    async fn classify(&self, _query: &str) -> Result<Option<RouteMatch>> {
        Ok(self.0.clone())
    }
}

/// Assistant wired to fakes: one canned FAQ/general answer, no product rows
pub fn assistant(
    generator: Arc<dyn TextGenerator>,
    classifier: StaticClassifier,
    faq_dispatch: FaqDispatch,
) -> ShoppingAssistant {
    let summarizer: Arc<dyn Summarizer> = Arc::new(StaticSummarizer::new("summary"));
    let memory = HandlerMemory::new(MemoryManager::new(MemoryConfig::default()), summarizer.clone());
    let fallback_memory = HandlerMemory::new(MemoryManager::new(MemoryConfig::fallback()), summarizer);
    let retriever = Arc::new(StaticRetriever::with_answers(&["Refunds take 5-7 days."]));

    let handlers = TopicHandlers {
        faq: Arc::new(FaqHandler::new(retriever.clone(), generator.clone(), memory.clone(), 2)),
        sql: Arc::new(SqlHandler::new(
            Arc::new(StaticSqlExecutor::new(vec![])),
            generator.clone(),
            memory.clone(),
            4,
        )),
        general_qa: Arc::new(GeneralQaHandler::new(retriever, generator.clone(), memory, 2)),
        fallback: Arc::new(FallbackHandler::new(generator, fallback_memory)),
    };

    ShoppingAssistant::new(IntentRouter::new(Arc::new(classifier)), handlers, faq_dispatch)
}
