//! `POST /chat`: the stateless request/response form of the relay.
//!
//! No history is kept: each request is resolved on its own. Fallback
//! replies are returned as the reply text.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::ws::frames::conversation_id;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "conversationId", deserialize_with = "conversation_id")]
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
}

pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Response {
    if body.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "message must not be empty" })),
        )
            .into_response();
    }

    let reply = state.resolver.resolve(&body.message).await;
    tracing::info!(
        conversation_id = %body.conversation_id,
        fallback = reply.is_fallback(),
        "chat reply"
    );

    let response = ChatResponse {
        message: reply.text,
        conversation_id: body.conversation_id,
    };
    match serde_json::to_value(&response) {
        Ok(json) => Json(json).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize chat reply");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
