//! In-process vector collection for question/answer knowledge.

use crate::models::{QaRecord, RetrievedDocument};
use crate::retrieval::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::retrieval::Retriever;
use crate::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct VectorEntry {
    id: String,
    question: String,
    answer: String,
    embedding: Vec<f32>,
}

/// Named collection: questions are embedded, answers ride along as metadata.
///
/// Records whose ingest failed are kept and re-ingested on the next search;
/// until that succeeds searches fail instead of returning nothing.
pub struct VectorCollection {
    name: String,
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<VectorEntry>>,
    pending: Mutex<Vec<QaRecord>>,
}

impl VectorCollection {
    pub fn new(name: impl Into<String>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            name: name.into(),
            embedder,
            entries: RwLock::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Embed and add records, once.
    ///
    /// A populated collection is left untouched; duplicate questions within a
    /// batch are stored once. Returns the number of entries added.
    pub async fn ingest(&self, records: &[QaRecord]) -> Result<usize> {
        if !self.is_empty().await {
            info!(collection = %self.name, "Collection already populated, skipping ingest");
            return Ok(0);
        }

        let mut seen = HashSet::new();
        let unique: Vec<&QaRecord> = records
            .iter()
            .filter(|r| seen.insert(entry_id(&r.question)))
            .collect();

        let questions: Vec<String> = unique.iter().map(|r| r.question.clone()).collect();
        let embeddings = match self.embedder.embed(&questions).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!(collection = %self.name, "Ingest failed, will retry on next search: {}", e);
                *self.pending.lock().await = unique.into_iter().cloned().collect();
                return Err(e);
            }
        };

        self.pending.lock().await.clear();

        let mut entries = self.entries.write().await;
        if !entries.is_empty() {
            return Ok(0);
        }

        entries.extend(unique.into_iter().zip(embeddings).map(|(record, embedding)| {
            VectorEntry {
                id: entry_id(&record.question),
                question: record.question.clone(),
                answer: record.answer.clone(),
                embedding,
            }
        }));

        info!(collection = %self.name, count = entries.len(), "Ingested knowledge records");
        Ok(entries.len())
    }
}

impl VectorCollection {
    async fn retry_pending(&self) -> Result<()> {
        let pending = self.pending.lock().await.clone();
        if pending.is_empty() {
            return Ok(());
        }

        info!(collection = %self.name, records = pending.len(), "Retrying failed ingest");
        self.ingest(&pending).await.map(|_| ())
    }
}

#[async_trait]
impl Retriever for VectorCollection {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        self.retry_pending().await?;
        if self.is_empty().await {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_one(query).await?;
        let entries = self.entries.read().await;

        let mut scored: Vec<(&VectorEntry, f32)> = entries
            .iter()
            .map(|entry| (entry, cosine_similarity(&query_embedding, &entry.embedding)))
            .collect();

        // Sort by score descending
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(entry, score)| RetrievedDocument {
                document: entry.question.clone(),
                metadata: HashMap::from([
                    ("id".to_string(), entry.id.clone()),
                    ("answer".to_string(), entry.answer.clone()),
                    ("score".to_string(), format!("{:.4}", score)),
                ]),
            })
            .collect())
    }
}

/// Load `[{"question": .., "answer": ..}]` from a JSON file
pub fn load_qa_records(path: &Path) -> Result<Vec<QaRecord>> {
    let data = std::fs::read_to_string(path)?;
    let records: Vec<QaRecord> = serde_json::from_str(&data)?;
    Ok(records)
}

/// Short stable id derived from the question text
fn entry_id(question: &str) -> String {
    let digest = Sha256::digest(question.trim().to_lowercase().as_bytes());
    hex::encode(&digest[..8])
}
