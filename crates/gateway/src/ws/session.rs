//! Lifecycle of one chat connection.
//!
//! `Connecting → Open → Closing → Closed`. Frames are handled strictly in
//! arrival order. The transport is abstracted as a stream of [`Inbound`]
//! items plus an outbound [`ServerFrame`] channel, so the whole state
//! machine runs without a socket in tests.

use std::pin::pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cr_domain::conversation::{Turn, CONTEXT_WINDOW};
use cr_domain::error::FallbackReason;
use cr_domain::trace::TraceEvent;
use cr_providers::{ReplySource, ResponseResolver};
use cr_sessions::{SessionId, SessionStore};

use super::frames::{ChatFrame, FrameError, ServerFrame, APOLOGY};
use super::registry::ConnectionRegistry;
use crate::state::AppState;

/// Inbound text frames buffered between the socket reader and the session.
const FRAME_QUEUE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// What the transport delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    /// A data frame whose bytes are not UTF-8 text.
    Undecodable,
    /// Control traffic with no meaning for the chat protocol.
    Ignored,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Disconnected,
}

#[derive(Debug, thiserror::Error)]
enum ExchangeError {
    #[error(transparent)]
    Store(#[from] cr_domain::error::Error),
    #[error("fallback reply served ({0})")]
    Fallback(FallbackReason),
    #[error("client disconnected")]
    Disconnected,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cleanup guard
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Deregisters the connection and destroys its conversation when dropped.
/// Runs exactly once, whether the session closes normally, errors, or its
/// task is aborted.
struct SessionGuard {
    id: SessionId,
    sessions: Arc<SessionStore>,
    connections: Arc<ConnectionRegistry>,
    frames: u64,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.connections.remove(&self.id);
        let turns = self.sessions.destroy(&self.id).unwrap_or(0);
        tracing::info!(
            session_id = %self.id,
            turns,
            frames = self.frames,
            "client disconnected"
        );
        TraceEvent::SessionClosed {
            session_id: self.id.to_string(),
            turns,
            frames: self.frames,
        }
        .emit();
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct StreamingSession {
    id: SessionId,
    state: ConnectionState,
    sessions: Arc<SessionStore>,
    resolver: Arc<ResponseResolver>,
    outbound: mpsc::Sender<ServerFrame>,
    guard: Option<SessionGuard>,
}

impl StreamingSession {
    /// Accept a connection: mint its id, start an empty conversation and
    /// register `outbound` as its push handle.
    pub fn open(app: &AppState, outbound: mpsc::Sender<ServerFrame>) -> Self {
        let id = SessionId::mint();
        let mut session = Self {
            id: id.clone(),
            state: ConnectionState::Connecting,
            sessions: app.sessions.clone(),
            resolver: app.resolver.clone(),
            outbound: outbound.clone(),
            guard: None,
        };

        app.sessions.create(&id);
        app.connections.register(id.clone(), outbound);
        session.guard = Some(SessionGuard {
            id: id.clone(),
            sessions: app.sessions.clone(),
            connections: app.connections.clone(),
            frames: 0,
        });

        tracing::info!(session_id = %id, "client connected");
        TraceEvent::SessionOpened {
            session_id: id.to_string(),
        }
        .emit();

        session.transition(ConnectionState::Open);
        session
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn transition(&mut self, next: ConnectionState) {
        tracing::debug!(session_id = %self.id, from = ?self.state, to = ?next, "connection state");
        self.state = next;
    }

    /// Process inbound frames until the client goes away, then clean up.
    pub async fn run<S>(mut self, inbound: S)
    where
        S: Stream<Item = Inbound> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let (frame_tx, mut frame_rx) = mpsc::channel::<Result<String, FrameError>>(FRAME_QUEUE);
        let reader = tokio::spawn(forward_inbound(inbound, frame_tx, cancel.clone()));

        while let Some(raw) = frame_rx.recv().await {
            if let Some(guard) = self.guard.as_mut() {
                guard.frames += 1;
            }
            if self.handle_frame(raw, &cancel).await == Flow::Disconnected {
                break;
            }
        }

        reader.abort();
        self.close();
    }

    fn close(&mut self) {
        self.transition(ConnectionState::Closing);
        drop(self.guard.take());
        self.transition(ConnectionState::Closed);
    }

    async fn handle_frame(
        &self,
        raw: Result<String, FrameError>,
        cancel: &CancellationToken,
    ) -> Flow {
        if cancel.is_cancelled() {
            return Flow::Disconnected;
        }

        let frame = match raw.and_then(|text| ChatFrame::parse(&text)) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "rejected inbound frame");
                return self.push(ServerFrame::error(e.to_string())).await;
            }
        };

        let outcome = match self.exchange(&frame.message, cancel).await {
            Ok(reply) => ServerFrame::ReceiveMessage {
                message: reply,
                conversation_id: frame.conversation_id,
            },
            Err(ExchangeError::Disconnected) => return Flow::Disconnected,
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "no generated reply");
                ServerFrame::error(APOLOGY)
            }
        };

        if self.push(ServerFrame::typing(false)).await == Flow::Disconnected {
            return Flow::Disconnected;
        }
        self.push(outcome).await
    }

    /// Record the user turn, generate a reply grounded in prior turns and
    /// record it. Fallback replies are not recorded.
    async fn exchange(
        &self,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ExchangeError> {
        // Snapshot before recording the new turn so it is not sent twice.
        let context = self.sessions.recent_context(&self.id, CONTEXT_WINDOW)?;
        self.sessions.append(&self.id, Turn::user(message))?;

        if self.push(ServerFrame::typing(true)).await == Flow::Disconnected {
            return Err(ExchangeError::Disconnected);
        }

        let reply = tokio::select! {
            reply = self.resolver.resolve_with_history(message, &context) => reply,
            _ = cancel.cancelled() => {
                tracing::info!(session_id = %self.id, "client left, dropping in-flight backend call");
                return Err(ExchangeError::Disconnected);
            }
        };

        match reply.source {
            ReplySource::Generated => {
                self.sessions
                    .append(&self.id, Turn::assistant(reply.text.clone()))?;
                tracing::debug!(session_id = %self.id, chars = reply.text.len(), "reply generated");
                Ok(reply.text)
            }
            ReplySource::Fallback(reason) => Err(ExchangeError::Fallback(reason)),
        }
    }

    async fn push(&self, frame: ServerFrame) -> Flow {
        match self.outbound.send(frame).await {
            Ok(()) => Flow::Continue,
            Err(_) => {
                tracing::debug!(session_id = %self.id, "outbound channel closed");
                Flow::Disconnected
            }
        }
    }
}

/// Pump transport items into the frame queue; cancel once the client is gone.
async fn forward_inbound<S>(
    inbound: S,
    frames: mpsc::Sender<Result<String, FrameError>>,
    cancel: CancellationToken,
) where
    S: Stream<Item = Inbound>,
{
    let mut inbound = pin!(inbound);
    while let Some(item) = inbound.next().await {
        let raw = match item {
            Inbound::Text(text) => Ok(text),
            Inbound::Undecodable => Err(FrameError::NotUtf8),
            Inbound::Ignored => continue,
            Inbound::Close => break,
        };
        if frames.send(raw).await.is_err() {
            break;
        }
    }
    cancel.cancel();
}
