use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::frames::ServerFrame;
use super::session::{Inbound, StreamingSession};
use crate::state::AppState;

/// Outbound frames buffered per connection before the session waits.
const OUTBOUND_QUEUE: usize = 64;

/// GET /ws: upgrade to WebSocket.
pub async fn chat_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sink, ws_stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerFrame>(OUTBOUND_QUEUE);

    let session = StreamingSession::open(&state, outbound_tx);

    // Writer task: forwards outbound frames to the WS sink.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = send_frame(&mut ws_sink, &frame).await {
                tracing::debug!(error = %e, "websocket write failed");
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    session.run(ws_stream.map(to_inbound)).await;

    // The session and registry held the only senders, so the writer drains
    // what is queued and stops.
    let _ = writer.await;
}

fn to_inbound(msg: Result<Message, axum::Error>) -> Inbound {
    match msg {
        Ok(Message::Text(text)) => Inbound::Text(text),
        Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
            Ok(text) => Inbound::Text(text),
            Err(_) => Inbound::Undecodable,
        },
        Ok(Message::Close(_)) => Inbound::Close,
        // axum answers pings itself.
        Ok(Message::Ping(_) | Message::Pong(_)) => Inbound::Ignored,
        Err(e) => {
            tracing::debug!(error = %e, "websocket read failed");
            Inbound::Close
        }
    }
}

async fn send_frame(
    sink: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    frame: &ServerFrame,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(frame).map_err(axum::Error::new)?;
    sink.send(Message::Text(json)).await
}
