use axum::{extract::State, Json};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::services::chat::{ChatMessage, ChatResponder};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<Value>> {
    if body.message.trim().is_empty() {
        return Err(AppError::Validation("Message cannot be empty".into()));
    }
    tracing::debug!(history_len = body.history.len(), "Chat message received");

    let catalog = state.repo.recommendations().await?.value;
    let responder = ChatResponder::new(state.ai.clone());
    let mut rng = StdRng::from_entropy();
    let reply = responder
        .respond(&body.message, &body.history, &catalog, &mut rng)
        .await;

    Ok(Json(json!({ "message": reply })))
}

pub async fn chat_status(State(state): State<AppState>) -> Json<Value> {
    let responder = ChatResponder::new(state.ai.clone());
    let status = if responder.is_available() { "online" } else { "offline" };
    Json(json!({ "status": status }))
}
