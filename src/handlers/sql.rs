//! Product search: the model writes SQL, the catalogue answers it, the model
//! phrases the rows as a product list.

use crate::error::ChatbotError;
use crate::handlers::{empty_context, HandlerMemory, TopicHandler};
use crate::llm::{GenerationRequest, ModelTier, TextGenerator};
use crate::memory::ChatSession;
use crate::models::Route;
use crate::prompts;
use crate::sql::{extract_sql, SqlExecutor, SqlRow};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

const SQL_TEMPERATURE: f32 = 0.3;

pub struct SqlHandler {
    executor: Arc<dyn SqlExecutor>,
    generator: Arc<dyn TextGenerator>,
    memory: HandlerMemory,
    row_limit: usize,
}

impl SqlHandler {
    pub fn new(
        executor: Arc<dyn SqlExecutor>,
        generator: Arc<dyn TextGenerator>,
        memory: HandlerMemory,
        row_limit: usize,
    ) -> Self {
        Self {
            executor,
            generator,
            memory,
            row_limit,
        }
    }

    async fn generate_query(&self, question: &str) -> Result<String> {
        let response = self
            .generator
            .generate(
                GenerationRequest::new(prompts::sql_generation())
                    .user_message(question)
                    .tier(ModelTier::Standard)
                    .temperature(SQL_TEMPERATURE),
            )
            .await?;

        extract_sql(&response)
    }
}

/// JSON rows for the answer prompt
fn rows_context(rows: &[SqlRow]) -> Result<String> {
    if rows.is_empty() {
        return Err(ChatbotError::RetrievalEmpty);
    }
    Ok(serde_json::to_string(rows)?)
}

#[async_trait]
impl TopicHandler for SqlHandler {
    fn route(&self) -> Route {
        Route::Sql
    }

    fn memory(&self) -> &HandlerMemory {
        &self.memory
    }

    async fn answer(&self, query: &str, session: &ChatSession) -> Result<String> {
        let sql = self.generate_query(query).await?;
        info!(%sql, "Generated product query");

        let rows = self.executor.execute(&sql, self.row_limit).await?;
        info!(rows = rows.len(), limit = self.row_limit, "Product query returned rows");

        let data = rows_context(&rows).or_else(empty_context)?;

        self.generator
            .generate(
                GenerationRequest::new(prompts::sql_answer(
                    session.format_summary(),
                    &session.format_history(),
                ))
                .user_message(prompts::sql_answer_input(query, &data))
                .tier(ModelTier::Standard)
                .temperature(SQL_TEMPERATURE),
            )
            .await
    }
}
