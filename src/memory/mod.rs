//! Conversation Memory
//!
//! Rolling chat window plus running summary for each conversation topic,
//! compacted by a pluggable summarizer

pub mod manager;
pub mod session;
pub mod summarizer;

pub use manager::{MemoryConfig, MemoryManager};
pub use session::{ChatSession, EMPTY_SENTINEL};
pub use summarizer::{LlmSummarizer, Summarizer};
