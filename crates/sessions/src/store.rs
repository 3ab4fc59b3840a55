//! In-memory conversation store.
//!
//! Maps each live [`SessionId`] to its ordered list of turns. The outer map
//! is only write-locked to create or destroy a session; appends and reads
//! lock the one conversation they touch, so sessions never contend with
//! each other beyond a brief shared read of the map.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use cr_domain::conversation::Turn;
use cr_domain::error::{Error, Result};

use crate::session_id::SessionId;

pub use cr_domain::conversation::CONTEXT_WINDOW;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Conversation {
    turns: Vec<Turn>,
    created_at: DateTime<Utc>,
}

impl Conversation {
    fn new() -> Self {
        Self {
            turns: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Thread-safe map from session identity to conversation.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Conversation>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty conversation for `id`.
    ///
    /// Returns `false` when a conversation already existed; it is replaced.
    pub fn create(&self, id: &SessionId) -> bool {
        let previous = self
            .sessions
            .write()
            .insert(id.clone(), Arc::new(Mutex::new(Conversation::new())));
        if previous.is_some() {
            tracing::warn!(session_id = %id, "session recreated, previous conversation dropped");
        }
        previous.is_none()
    }

    /// Append a turn to the end of the session's conversation.
    pub fn append(&self, id: &SessionId, turn: Turn) -> Result<()> {
        let conversation = self.conversation(id)?;
        conversation.lock().turns.push(turn);
        Ok(())
    }

    /// The last `limit` turns, oldest first. Shorter conversations are
    /// returned whole.
    pub fn recent_context(&self, id: &SessionId, limit: usize) -> Result<Vec<Turn>> {
        let conversation = self.conversation(id)?;
        let conv = conversation.lock();
        let start = conv.turns.len().saturating_sub(limit);
        Ok(conv.turns[start..].to_vec())
    }

    /// Drop the session's conversation. Returns the number of turns it held,
    /// or `None` if the session was unknown.
    pub fn destroy(&self, id: &SessionId) -> Option<usize> {
        let removed = self.sessions.write().remove(id)?;
        let conv = removed.lock();
        tracing::debug!(
            session_id = %id,
            turns = conv.turns.len(),
            lifetime_ms = (Utc::now() - conv.created_at).num_milliseconds(),
            "conversation destroyed"
        );
        Some(conv.turns.len())
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().contains_key(id)
    }

    /// Full copy of a session's turns.
    pub fn turns(&self, id: &SessionId) -> Option<Vec<Turn>> {
        let conversation = self.sessions.read().get(id).cloned()?;
        let turns = conversation.lock().turns.clone();
        Some(turns)
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn conversation(&self, id: &SessionId) -> Result<Arc<Mutex<Conversation>>> {
        self.sessions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use cr_domain::conversation::Role;

    #[test]
    fn new_session_has_empty_context() {
        let store = SessionStore::new();
        let id = SessionId::mint();
        assert!(store.create(&id));
        assert!(store.recent_context(&id, CONTEXT_WINDOW).unwrap().is_empty());
    }

    #[test]
    fn short_history_is_returned_whole_in_order() {
        let store = SessionStore::new();
        let id = SessionId::mint();
        store.create(&id);
        store.append(&id, Turn::user("one")).unwrap();
        store.append(&id, Turn::assistant("two")).unwrap();
        store.append(&id, Turn::user("three")).unwrap();

        let ctx = store.recent_context(&id, CONTEXT_WINDOW).unwrap();
        let contents: Vec<&str> = ctx.iter().map(Turn::content).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(ctx[1].role(), Role::Assistant);
    }

    #[test]
    fn long_history_keeps_last_ten_oldest_first() {
        let store = SessionStore::new();
        let id = SessionId::mint();
        store.create(&id);
        for i in 0..25 {
            store.append(&id, Turn::user(format!("m{i}"))).unwrap();
        }

        let ctx = store.recent_context(&id, CONTEXT_WINDOW).unwrap();
        assert_eq!(ctx.len(), 10);
        assert_eq!(ctx.first().unwrap().content(), "m15");
        assert_eq!(ctx.last().unwrap().content(), "m24");
        // Storage itself is unbounded.
        assert_eq!(store.turns(&id).unwrap().len(), 25);
    }

    #[test]
    fn destroy_removes_session() {
        let store = SessionStore::new();
        let id = SessionId::mint();
        store.create(&id);
        store.append(&id, Turn::user("hi")).unwrap();

        assert_eq!(store.destroy(&id), Some(1));
        assert!(!store.contains(&id));
        assert!(store.destroy(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn append_to_unknown_session_fails() {
        let store = SessionStore::new();
        let err = store.append(&SessionId::mint(), Turn::user("hi")).unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
        assert!(store.recent_context(&SessionId::mint(), 10).is_err());
    }

    #[test]
    fn recreate_resets_conversation() {
        let store = SessionStore::new();
        let id = SessionId::mint();
        store.create(&id);
        store.append(&id, Turn::user("old")).unwrap();
        assert!(!store.create(&id));
        assert!(store.turns(&id).unwrap().is_empty());
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        let a = SessionId::mint();
        let b = SessionId::mint();
        store.create(&a);
        store.create(&b);
        store.append(&a, Turn::user("from a")).unwrap();
        store.append(&b, Turn::user("from b")).unwrap();

        assert_eq!(store.turns(&a).unwrap(), vec![Turn::user("from a")]);
        assert_eq!(store.turns(&b).unwrap(), vec![Turn::user("from b")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sessions_do_not_corrupt_each_other() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();

        for n in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = SessionId::mint();
                store.create(&id);
                for i in 0..50 {
                    store.append(&id, Turn::user(format!("{n}-{i}"))).unwrap();
                    tokio::task::yield_now().await;
                }
                let turns = store.turns(&id).unwrap();
                if n % 2 == 0 {
                    store.destroy(&id);
                }
                (n, turns)
            }));
        }

        for handle in handles {
            let (n, turns) = handle.await.unwrap();
            assert_eq!(turns.len(), 50);
            for (i, turn) in turns.iter().enumerate() {
                assert_eq!(turn.content(), format!("{n}-{i}"));
            }
        }
        assert_eq!(store.len(), 8);
    }
}
