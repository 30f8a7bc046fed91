//! Environment-driven configuration
//!
//! Values come from the process environment (after `dotenv` has loaded any
//! `.env` file). Everything has a default so a bare checkout can start.

use crate::error::ChatbotError;
use crate::memory::MemoryConfig;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Which handler the `faq` route dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaqDispatch {
    VectorSearch,
    Fallback,
}

impl FromStr for FaqDispatch {
    type Err = ChatbotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "vector_search" | "vector" | "faq" => Ok(FaqDispatch::VectorSearch),
            "fallback" => Ok(FaqDispatch::Fallback),
            other => Err(ChatbotError::Config(format!(
                "FAQ_DISPATCH must be 'vector_search' or 'fallback', got '{}'",
                other
            ))),
        }
    }
}

/// Chat-completions settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    /// Model for SQL, fallback and summaries
    pub model: String,
    /// Model for short retrieval answers
    pub fast_model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            fast_model: "llama-3.1-8b-instant".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Embeddings endpoint settings
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub llm: LlmConfig,
    pub embeddings: EmbeddingConfig,
    pub product_db_url: String,
    pub faq_data_path: PathBuf,
    pub general_qa_data_path: PathBuf,
    pub retrieval_top_k: usize,
    pub sql_row_limit: usize,
    /// Bounds connection wait and execution of one product query
    pub sql_timeout: Duration,
    pub router_threshold: f32,
    pub faq_dispatch: FaqDispatch,
    /// Memory policy for faq, sql and general_qa sessions
    pub topic_memory: MemoryConfig,
    pub fallback_memory: MemoryConfig,
    /// Idle API conversations older than this are dropped
    pub conversation_ttl: Duration,
    pub port: u16,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            embeddings: EmbeddingConfig::default(),
            product_db_url: "sqlite://db.sqlite".to_string(),
            faq_data_path: PathBuf::from("resources/faq_data.json"),
            general_qa_data_path: PathBuf::from("resources/general_qa.json"),
            retrieval_top_k: 2,
            sql_row_limit: 4,
            sql_timeout: Duration::from_secs(10),
            router_threshold: 0.3,
            faq_dispatch: FaqDispatch::VectorSearch,
            topic_memory: MemoryConfig::default(),
            fallback_memory: MemoryConfig::fallback(),
            conversation_ttl: Duration::from_secs(30 * 60),
            port: 8080,
        }
    }
}

impl BotConfig {
    /// Build configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(key) = env::var("GROQ_API_KEY") {
            config.llm.api_key = key;
        } else {
            warn!("GROQ_API_KEY not set; generation calls will fail");
        }
        if let Ok(url) = env::var("GROQ_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = env::var("GROQ_MODEL") {
            config.llm.model = model;
        }
        if let Ok(model) = env::var("GROQ_FAST") {
            config.llm.fast_model = model;
        }
        if let Some(secs) = parse_var::<u64>("LLM_TIMEOUT_SECS")? {
            config.llm.timeout = Duration::from_secs(secs);
            config.embeddings.timeout = Duration::from_secs(secs);
        }

        config.embeddings.api_key = env::var("EMBEDDING_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_default();
        if let Ok(url) = env::var("EMBEDDING_BASE_URL") {
            config.embeddings.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = env::var("EMBEDDING_MODEL") {
            config.embeddings.model = model;
        }

        if let Ok(url) = env::var("PRODUCT_DB_URL") {
            config.product_db_url = url;
        }
        if let Ok(path) = env::var("FAQ_DATA_PATH") {
            config.faq_data_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("GENERAL_QA_DATA_PATH") {
            config.general_qa_data_path = PathBuf::from(path);
        }
        if let Some(k) = parse_var("RETRIEVAL_TOP_K")? {
            config.retrieval_top_k = k;
        }
        if let Some(limit) = parse_var("SQL_ROW_LIMIT")? {
            config.sql_row_limit = limit;
        }
        if let Some(secs) = parse_var::<u64>("SQL_TIMEOUT_SECS")? {
            config.sql_timeout = Duration::from_secs(secs);
        }
        if let Some(threshold) = parse_var("ROUTER_THRESHOLD")? {
            config.router_threshold = threshold;
        }
        if let Ok(dispatch) = env::var("FAQ_DISPATCH") {
            config.faq_dispatch = dispatch.parse()?;
        }

        if let Some(secs) = parse_var::<u64>("CONVERSATION_TTL_SECS")? {
            config.conversation_ttl = Duration::from_secs(secs);
        }

        let port = env::var("PORT").or_else(|_| env::var("API_PORT")).ok();
        if let Some(port) = port {
            config.port = port
                .parse()
                .map_err(|_| ChatbotError::Config(format!("invalid port '{}'", port)))?;
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ChatbotError::Config(format!("{} has invalid value '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.retrieval_top_k, 2);
        assert_eq!(config.sql_row_limit, 4);
        assert_eq!(config.topic_memory.summary_trigger, 8);
        assert_eq!(config.fallback_memory.summary_trigger, 16);
        assert_eq!(config.faq_dispatch, FaqDispatch::VectorSearch);
        assert_eq!(config.sql_timeout, Duration::from_secs(10));
        assert_eq!(config.conversation_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn test_faq_dispatch_parse() {
        assert_eq!("fallback".parse::<FaqDispatch>().unwrap(), FaqDispatch::Fallback);
        assert_eq!(
            "Vector_Search".parse::<FaqDispatch>().unwrap(),
            FaqDispatch::VectorSearch
        );
        assert!("sometimes".parse::<FaqDispatch>().is_err());
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        env::set_var("SHOPPING_ASSISTANT_TEST_TOP_K", "two");
        let parsed = parse_var::<usize>("SHOPPING_ASSISTANT_TEST_TOP_K");
        assert!(matches!(parsed, Err(ChatbotError::Config(_))));
        env::remove_var("SHOPPING_ASSISTANT_TEST_TOP_K");
    }
}
