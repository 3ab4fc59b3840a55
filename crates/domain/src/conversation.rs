use serde::{Deserialize, Serialize};

/// Fixed system prompt sent with every generation request.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Be concise, friendly, and helpful in your responses.";

/// Number of most recent turns used to ground a reply.
pub const CONTEXT_WINDOW: usize = 10;

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation. Fields are private so a turn cannot be
/// edited after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Canonical input handed to every backend adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    /// Bounded recent history, oldest first. Does not include `user_message`.
    pub history: Vec<Turn>,
    pub user_message: String,
}

impl GenerationRequest {
    /// Build a request with the default system prompt.
    pub fn new(user_message: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            history,
            user_message: user_message.into(),
        }
    }
}
