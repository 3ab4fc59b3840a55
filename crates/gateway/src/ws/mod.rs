//! WebSocket chat endpoint.
//!
//! Flow:
//! 1. Client connects to `/ws`; a session id is minted and registered.
//! 2. Client sends `{"message", "conversationId"}` frames.
//! 3. For each frame the relay pushes `typing` on, then `typing` off, then
//!    either `receiveMessage` or `error`.
//! 4. On disconnect the conversation is destroyed and the handle removed.

pub mod frames;
pub mod handler;
pub mod registry;
pub mod session;

pub use handler::chat_ws;
