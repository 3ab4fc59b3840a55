use serde::Serialize;

/// Structured trace events emitted across all chatrelay crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    BackendRequest {
        backend: String,
        duration_ms: u64,
        ok: bool,
    },
    FallbackServed {
        backend: String,
        reason: String,
        error: String,
    },
    SessionOpened {
        session_id: String,
    },
    SessionClosed {
        session_id: String,
        turns: usize,
        frames: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "cr_event");
    }
}
