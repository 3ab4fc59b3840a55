//! JSON frames exchanged over the chat WebSocket.

use serde::{Deserialize, Deserializer, Serialize};

/// Sent to the client when a reply could not be generated.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outbound
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    #[serde(rename = "typing")]
    Typing {
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
    #[serde(rename = "receiveMessage")]
    ReceiveMessage {
        message: String,
        #[serde(rename = "conversationId")]
        conversation_id: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerFrame {
    pub fn typing(is_typing: bool) -> Self {
        Self::Typing { is_typing }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Inbound
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientFrame {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(
        default,
        rename = "conversationId",
        deserialize_with = "conversation_id"
    )]
    pub conversation_id: String,
}

/// Why an inbound frame was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid message format: {0}")]
    Malformed(String),
    #[error("message is required")]
    MissingMessage,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("invalid message format: frame is not valid UTF-8")]
    NotUtf8,
}

/// A frame that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatFrame {
    pub message: String,
    pub conversation_id: String,
}

impl ChatFrame {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let frame: ClientFrame =
            serde_json::from_str(text).map_err(|e| FrameError::Malformed(e.to_string()))?;
        let message = frame.message.ok_or(FrameError::MissingMessage)?;
        if message.trim().is_empty() {
            return Err(FrameError::EmptyMessage);
        }
        Ok(Self {
            message,
            conversation_id: frame.conversation_id,
        })
    }
}

/// Accept `conversationId` as a string or a number (web clients commonly
/// send `Date.now()`); `null` becomes the empty string.
pub fn conversation_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "conversationId must be a string or number, got {other}"
        ))),
    }
}
