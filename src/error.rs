//! Error types for the shopping assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, ChatbotError>;

/// Shown when the router finds no route for a query
pub const CLARIFY_MESSAGE: &str = "🤔 I didn't quite understand that. Could you rephrase?";

/// Shown for any collaborator outage
pub const UNAVAILABLE_MESSAGE: &str = "⚠️ I'm temporarily unavailable due to high traffic or system load. \
     Please try again in a few minutes.";

pub const SQL_GENERATION_MESSAGE: &str =
    "Sorry, I wasn't able to build a product search for your question.";

pub const SQL_EXECUTION_MESSAGE: &str =
    "Sorry, there was a problem running the product search.";

#[derive(Error, Debug)]
pub enum ChatbotError {

    // =============================
    // Turn Pipeline Errors
    // =============================

    #[error("No route matched the query")]
    RoutingAmbiguous,

    #[error("Retrieval returned no context")]
    RetrievalEmpty,

    #[error("Generation error: {0}")]
    GenerationFailure(String),

    #[error("SQL generation error: {0}")]
    SqlGenerationFailure(String),

    #[error("SQL statement rejected: {0}")]
    SqlRejected(String),

    #[error("SQL execution error: {0}")]
    SqlExecution(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatbotError {
    /// Text shown to the shopper in place of a raw error.
    pub fn user_message(&self) -> &'static str {
        match self {
            ChatbotError::RoutingAmbiguous => CLARIFY_MESSAGE,
            ChatbotError::SqlGenerationFailure(_) | ChatbotError::SqlRejected(_) => {
                SQL_GENERATION_MESSAGE
            }
            ChatbotError::SqlExecution(_) | ChatbotError::Database(_) => {
                SQL_EXECUTION_MESSAGE
            }
            _ => UNAVAILABLE_MESSAGE,
        }
    }
}
