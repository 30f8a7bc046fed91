//! REST API for the shopping assistant
//!
//! Each conversation id owns its own memory; turns within one conversation
//! are serialized, different conversations run concurrently.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::assistant::{Conversation, ShoppingAssistant};
use crate::models::Route;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub conversation_id: Uuid,
    pub answer: String,
    pub route: Option<Route>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

struct ConversationSlot {
    conversation: Arc<Mutex<Conversation>>,
    last_active: Instant,
}

type ConversationMap = HashMap<Uuid, ConversationSlot>;

#[derive(Clone)]
pub struct ApiState {
    pub assistant: Arc<ShoppingAssistant>,
    conversations: Arc<RwLock<ConversationMap>>,
    conversation_ttl: Duration,
}

impl ApiState {
    pub fn new(assistant: Arc<ShoppingAssistant>, conversation_ttl: Duration) -> Self {
        Self {
            assistant,
            conversations: Arc::new(RwLock::new(HashMap::new())),
            conversation_ttl,
        }
    }

    /// Look up or create a conversation and mark it active. Creating one
    /// first drops every conversation idle for longer than the TTL.
    async fn conversation(&self, id: Uuid) -> Arc<Mutex<Conversation>> {
        let mut conversations = self.conversations.write().await;
        let now = Instant::now();

        if let Some(slot) = conversations.get_mut(&id) {
            slot.last_active = now;
            return slot.conversation.clone();
        }

        let before = conversations.len();
        let ttl = self.conversation_ttl;
        conversations.retain(|_, slot| now.duration_since(slot.last_active) < ttl);
        let evicted = before - conversations.len();
        if evicted > 0 {
            info!(evicted, "Dropped idle conversations");
        }

        conversations
            .entry(id)
            .or_insert_with(|| ConversationSlot {
                conversation: Arc::new(Mutex::new(Conversation::with_id(id))),
                last_active: now,
            })
            .conversation
            .clone()
    }

    async fn remove(&self, id: Uuid) -> bool {
        self.conversations.write().await.remove(&id).is_some()
    }

    async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

/// =============================
/// Helpers
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// Client ids that are not UUIDs map to a stable UUID; no id starts a new
/// conversation
fn conversation_id(value: Option<&str>) -> Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => Uuid::new_v4(),
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Message must not be empty".into())),
        );
    }

    let id = conversation_id(req.conversation_id.as_deref());
    info!(conversation_id = %id, "Received chat message");

    let conversation = state.conversation(id).await;
    let mut conversation = conversation.lock().await;
    let reply = state.assistant.respond(&mut conversation, &req.message).await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(ChatReply {
            conversation_id: id,
            answer: reply.answer,
            route: reply.route,
        })),
    )
}

/// =============================
/// Session Reset Endpoint
/// =============================

async fn delete_conversation(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    let id = conversation_id(Some(&id));

    if state.remove(id).await {
        info!(conversation_id = %id, "Conversation reset");
        (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({ "conversation_id": id }))),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Unknown conversation {}", id))),
        )
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(assistant: Arc<ShoppingAssistant>, conversation_ttl: Duration) -> Router {
    router_with_state(ApiState::new(assistant, conversation_ttl))
}

fn router_with_state(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/conversations/:id", delete(delete_conversation))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    assistant: Arc<ShoppingAssistant>,
    conversation_ttl: Duration,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(assistant, conversation_ttl);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
