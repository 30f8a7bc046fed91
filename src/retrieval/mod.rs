//! Retrieval collaborators
//!
//! Handlers ask a [`Retriever`] for the top-k documents for a query. The
//! in-process [`VectorCollection`] is the default; anything that can answer
//! `search` (a hosted vector database, a fixture) plugs in the same way.

use crate::models::RetrievedDocument;
use crate::Result;
use async_trait::async_trait;

pub mod embeddings;
pub mod store;

pub use embeddings::{cosine_similarity, EmbeddingProvider, OpenAiEmbeddings};
pub use store::{load_qa_records, VectorCollection};

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` documents, most relevant first
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>>;
}
