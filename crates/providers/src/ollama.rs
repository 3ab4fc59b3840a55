//! Local inference adapter (Ollama).
//!
//! Flattens the request into one plain-text prompt and posts it to
//! `{base_url}/api/generate` with streaming disabled. The reply text is the
//! `response` field of the JSON body.

use std::time::Duration;

use serde_json::Value;

use cr_domain::config::OllamaConfig;
use cr_domain::conversation::GenerationRequest;
use cr_domain::error::{GenerationError, Result};

use crate::traits::TextBackend;
use crate::util::{from_reqwest, http_client, http_client_with_timeout, parse_json, status_error};

const PROVIDER: &str = "ollama";

pub struct OllamaBackend {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn from_config(cfg: &OllamaConfig) -> Result<Self> {
        Self::new(&cfg.base_url, &cfg.model)
    }

    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: http_client()?,
        })
    }

    /// Replace the default 30 s per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client_with_timeout(timeout)?;
        Ok(self)
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

/// Render the request as:
///
/// ```text
/// {system}
///
/// {role}: {content}      (one line per history turn)
/// user: {message}
/// assistant:
/// ```
pub fn build_prompt(req: &GenerationRequest) -> String {
    let mut prompt = String::new();
    prompt.push_str(&req.system_prompt);
    prompt.push_str("\n\n");
    for turn in &req.history {
        prompt.push_str(turn.role().as_str());
        prompt.push_str(": ");
        prompt.push_str(turn.content());
        prompt.push('\n');
    }
    prompt.push_str("user: ");
    prompt.push_str(&req.user_message);
    prompt.push_str("\nassistant:");
    prompt
}

fn parse_generate_response(body: &Value) -> std::result::Result<String, GenerationError> {
    body.get("response")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| GenerationError::provider(PROVIDER, "missing 'response' field"))
}

#[async_trait::async_trait]
impl TextBackend for OllamaBackend {
    async fn generate(&self, req: &GenerationRequest) -> std::result::Result<String, GenerationError> {
        let url = self.generate_url();
        let body = serde_json::json!({
            "model": self.model,
            "prompt": build_prompt(req),
            "stream": false,
        });

        tracing::debug!(url = %url, model = %self.model, "ollama generate request");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| from_reqwest(PROVIDER, e))?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(|e| from_reqwest(PROVIDER, e))?;
        if status != reqwest::StatusCode::OK {
            return Err(status_error(PROVIDER, status, &resp_text));
        }

        parse_generate_response(&parse_json(PROVIDER, &resp_text)?)
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
    fn prompt_without_history() {
        let mut req = GenerationRequest::new("hi there", Vec::new());
        req.system_prompt = "Be brief.".into();
        assert_eq!(build_prompt(&req), "Be brief.\n\nuser: hi there\nassistant:");
    }

    #[test]
    fn prompt_lists_history_as_role_lines() {
        let mut req = GenerationRequest::new(
            "and now?",
            vec![Turn::user("hello"), Turn::assistant("hi!")],
        );
        req.system_prompt = "SYS".into();
        assert_eq!(
            build_prompt(&req),
            "SYS\n\nuser: hello\nassistant: hi!\nuser: and now?\nassistant:"
        );
    }

    #[test]
    fn response_field_is_extracted_unchanged() {
        let body = serde_json::json!({"model": "llama2", "response": " Sure thing.\n", "done": true});
        assert_eq!(parse_generate_response(&body).unwrap(), " Sure thing.\n");
    }

    #[test]
    fn missing_response_field_is_a_provider_error() {
        let err = parse_generate_response(&serde_json::json!({"done": true})).unwrap_err();
        assert!(matches!(err, GenerationError::Provider { .. }));
    }
}
