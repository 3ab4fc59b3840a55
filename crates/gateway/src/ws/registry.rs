//! In-memory registry of open chat connections.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use cr_sessions::SessionId;

use super::frames::ServerFrame;

/// Channel to a connection's WebSocket writer task.
pub type ClientSink = mpsc::Sender<ServerFrame>;

struct ConnectedClient {
    connected_at: DateTime<Utc>,
    sink: ClientSink,
}

/// Thread-safe registry of all open connections.
#[derive(Default)]
pub struct ConnectionRegistry {
    clients: RwLock<HashMap<SessionId, ConnectedClient>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: SessionId, sink: ClientSink) {
        tracing::debug!(session_id = %id, "connection registered");
        self.clients.write().insert(
            id,
            ConnectedClient {
                connected_at: Utc::now(),
                sink,
            },
        );
    }

    /// Remove a connection (on disconnect). Returns whether it was present.
    pub fn remove(&self, id: &SessionId) -> bool {
        match self.clients.write().remove(id) {
            Some(client) => {
                let open_secs = Utc::now()
                    .signed_duration_since(client.connected_at)
                    .num_seconds();
                tracing::debug!(session_id = %id, open_secs, "connection removed");
                true
            }
            None => false,
        }
    }

    /// Get the sink for pushing frames to a connection.
    pub fn get_sink(&self, id: &SessionId) -> Option<ClientSink> {
        self.clients.read().get(id).map(|c| c.sink.clone())
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.clients.read().contains_key(id)
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_sink_reaches_the_connection() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(4);
        let id = SessionId::mint();
        registry.register(id.clone(), tx);

        let sink = registry.get_sink(&id).unwrap();
        sink.send(ServerFrame::typing(true)).await.unwrap();
        assert_eq!(rx.recv().await, Some(ServerFrame::typing(true)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        let id = SessionId::mint();
        registry.register(id.clone(), tx);

        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.is_empty());
        assert!(registry.get_sink(&id).is_none());
    }
}
