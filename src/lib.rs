//! E-commerce Shopping Assistant
//!
//! A retrieval-augmented chatbot for an online store that:
//! - Routes each query to FAQ, product search, general help or a fallback agent
//! - Answers FAQs and general questions from vector-searched knowledge
//! - Turns product questions into read-only SQL over the catalogue
//! - Keeps a bounded memory per topic, compacting old turns into a summary
//!
//! TURN LOOP:
//! QUERY → ROUTE → RETRIEVE → GENERATE → REMEMBER (→ COMPACT)

pub mod api;
pub mod assistant;
pub mod config;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod memory;
pub mod models;
pub mod prompts;
pub mod retrieval;
pub mod routing;
pub mod sql;

#[cfg(test)]
mod testing;

pub use error::Result;

// Re-export common types
pub use assistant::{Conversation, ShoppingAssistant};
pub use config::BotConfig;
pub use models::*;
