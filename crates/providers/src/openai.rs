//! Hosted chat-completions adapter (OpenAI).
//!
//! Sends the system prompt, bounded history and user turn as a chat message
//! array to `{base_url}/chat/completions` and returns the first choice's
//! text. HTTP 429 (rate limit or exhausted quota) is reported separately so
//! the fallback reply can say so.

use std::time::Duration;

use serde_json::Value;

use cr_domain::config::OpenAiConfig;
use cr_domain::conversation::GenerationRequest;
use cr_domain::error::{GenerationError, Result};

use crate::traits::TextBackend;
use crate::util::{from_reqwest, http_client, http_client_with_timeout, parse_json, resolve_api_key, status_error};

/// Output-token cap for every completion.
pub const MAX_TOKENS: u32 = 500;
/// Sampling temperature for every completion.
pub const TEMPERATURE: f32 = 0.7;

const PROVIDER: &str = "openai";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiBackend {
    base_url: String,
    model: String,
    /// `None` puts the adapter in not-configured mode: no calls are made.
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiBackend {
    /// Create the adapter from config, reading the key from `api_key_env`.
    pub fn from_config(cfg: &OpenAiConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.api_key_env);
        if api_key.is_none() {
            tracing::warn!(
                env_var = %cfg.api_key_env,
                "OpenAI API key not set, replies will use demo mode"
            );
        }
        Self::new(&cfg.base_url, &cfg.model, api_key)
    }

    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client: http_client()?,
        })
    }

    /// Replace the default 30 s per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client_with_timeout(timeout)?;
        Ok(self)
    }

    fn build_chat_body(&self, req: &GenerationRequest) -> Value {
        serde_json::json!({
            "model": self.model,
            "messages": build_messages(req),
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// System message, then history in order, then the new user message.
fn build_messages(req: &GenerationRequest) -> Vec<Value> {
    let mut messages = Vec::with_capacity(req.history.len() + 2);
    messages.push(serde_json::json!({"role": "system", "content": req.system_prompt}));
    for turn in &req.history {
        messages.push(serde_json::json!({
            "role": turn.role().as_str(),
            "content": turn.content(),
        }));
    }
    messages.push(serde_json::json!({"role": "user", "content": req.user_message}));
    messages
}

fn parse_completion(body: &Value) -> std::result::Result<String, GenerationError> {
    let choice = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| GenerationError::provider(PROVIDER, "no choices in response"))?;

    choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| GenerationError::provider(PROVIDER, "no message content in choice"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl TextBackend for OpenAiBackend {
    async fn generate(&self, req: &GenerationRequest) -> std::result::Result<String, GenerationError> {
        let Some(api_key) = &self.api_key else {
            return Err(GenerationError::not_configured(PROVIDER, "API key not set"));
        };

        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_chat_body(req);

        tracing::debug!(
            url = %url,
            model = %self.model,
            history = req.history.len(),
            "openai chat request"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| from_reqwest(PROVIDER, e))?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(|e| from_reqwest(PROVIDER, e))?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::rate_limited(
                PROVIDER,
                format!("HTTP 429 - {}", resp_text.chars().take(200).collect::<String>()),
            ));
        }
        if !status.is_success() {
            return Err(status_error(PROVIDER, status, &resp_text));
        }

        let resp_json = parse_json(PROVIDER, &resp_text)?;
        parse_completion(&resp_json)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cr_domain::conversation::Turn;

    #[test]
    fn messages_are_system_history_then_user() {
        let req = GenerationRequest::new(
            "what next?",
            vec![Turn::user("hi"), Turn::assistant("hello!")],
        );
        let messages = build_messages(&req);
        let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[3]["content"], "what next?");
    }

    #[test]
    fn body_carries_fixed_generation_parameters() {
        let backend = OpenAiBackend::new("https://api.openai.com/v1/", "gpt-3.5-turbo", None).unwrap();
        let body = backend.build_chat_body(&GenerationRequest::new("hi", Vec::new()));
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], 500);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(backend.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn first_choice_content_is_extracted() {
        let body = serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]
        });
        assert_eq!(parse_completion(&body).unwrap(), "first");
    }

    #[test]
    fn empty_choices_is_a_provider_error() {
        let err = parse_completion(&serde_json::json!({"choices": []})).unwrap_err();
        assert!(matches!(err, GenerationError::Provider { .. }));
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        // Unroutable base URL: any attempted call would surface as a provider error.
        let backend = OpenAiBackend::new("http://127.0.0.1:9", "gpt-3.5-turbo", None).unwrap();
        let err = backend
            .generate(&GenerationRequest::new("hi", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured { .. }));
    }
}
