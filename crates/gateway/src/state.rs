use std::sync::Arc;

use cr_domain::config::Config;
use cr_providers::ResponseResolver;
use cr_sessions::SessionStore;

use crate::ws::registry::ConnectionRegistry;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Selected once at startup; shared by the HTTP and WebSocket paths.
    pub resolver: Arc<ResponseResolver>,
    /// Conversation per open WebSocket connection.
    pub sessions: Arc<SessionStore>,
    /// Outbound handles of open WebSocket connections.
    pub connections: Arc<ConnectionRegistry>,
}

impl AppState {
    pub fn new(config: Arc<Config>, resolver: Arc<ResponseResolver>) -> Self {
        Self {
            config,
            resolver,
            sessions: Arc::new(SessionStore::new()),
            connections: Arc::new(ConnectionRegistry::new()),
        }
    }
}
