//! Shared types for the chatrelay crates: conversation turns, the
//! generation error taxonomy, configuration and structured trace events.

pub mod config;
pub mod conversation;
pub mod error;
pub mod trace;
