//! Third-party inference adapter (Hugging Face Inference API).
//!
//! Stateless: only the raw user message is sent, history is ignored.
//! Requires an API token; without one no call is attempted.

use std::time::Duration;

use serde_json::Value;

use cr_domain::config::HuggingFaceConfig;
use cr_domain::conversation::GenerationRequest;
use cr_domain::error::{GenerationError, Result};

use crate::traits::TextBackend;
use crate::util::{from_reqwest, http_client, http_client_with_timeout, parse_json, resolve_api_key, status_error};

const PROVIDER: &str = "huggingface";

pub struct HuggingFaceBackend {
    model_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HuggingFaceBackend {
    pub fn from_config(cfg: &HuggingFaceConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.api_key_env);
        if api_key.is_none() {
            tracing::warn!(
                env_var = %cfg.api_key_env,
                "Hugging Face API token not set, replies will use demo mode"
            );
        }
        Self::new(&cfg.base_url, &cfg.model, api_key)
    }

    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            model_url: format!("{}/{}", base_url.trim_end_matches('/'), model),
            api_key,
            client: http_client()?,
        })
    }

    /// Replace the default 30 s per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client_with_timeout(timeout)?;
        Ok(self)
    }
}

/// Accepts both `[{"generated_text": ..}]` and `{"generated_text": ..}`.
fn parse_generated_text(body: &Value) -> std::result::Result<String, GenerationError> {
    let item = match body {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    item.and_then(|i| i.get("generated_text"))
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| GenerationError::provider(PROVIDER, "missing 'generated_text' field"))
}

#[async_trait::async_trait]
impl TextBackend for HuggingFaceBackend {
    async fn generate(&self, req: &GenerationRequest) -> std::result::Result<String, GenerationError> {
        let Some(api_key) = &self.api_key else {
            return Err(GenerationError::not_configured(PROVIDER, "API token not set"));
        };

        tracing::debug!(url = %self.model_url, "huggingface inference request");

        let resp = self
            .client
            .post(&self.model_url)
            .bearer_auth(api_key)
            .json(&serde_json::json!({ "inputs": req.user_message }))
            .send()
            .await
            .map_err(|e| from_reqwest(PROVIDER, e))?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(|e| from_reqwest(PROVIDER, e))?;
        if status != reqwest::StatusCode::OK {
            return Err(status_error(PROVIDER, status, &resp_text));
        }

        parse_generated_text(&parse_json(PROVIDER, &resp_text)?)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
