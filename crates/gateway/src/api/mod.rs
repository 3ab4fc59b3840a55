pub mod chat;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the full router.
///
/// The HTTP routes are served both bare and under `/api`; the WebSocket
/// endpoint lives at `/ws`.
pub fn router() -> Router<AppState> {
    let http = Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat));

    Router::new()
        .merge(http.clone())
        .nest("/api", http)
        .route("/ws", get(ws::chat_ws))
}
