//! Per-connection conversation state for chatrelay.
//!
//! Each live connection gets a freshly minted [`SessionId`] and an
//! in-memory conversation in the [`SessionStore`]. Conversations exist only
//! while their connection is open and are never persisted.

pub mod session_id;
pub mod store;

pub use session_id::SessionId;
pub use store::{SessionStore, CONTEXT_WINDOW};
