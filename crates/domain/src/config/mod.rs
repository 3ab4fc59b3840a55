mod backend;
mod observability;
mod server;

pub use backend::*;
pub use observability::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Environment overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Environment variables that override values from the config file.
pub const ENV_PROVIDER: &str = "AI_PROVIDER";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";
pub const ENV_OLLAMA_MODEL: &str = "OLLAMA_MODEL";
pub const ENV_HUGGINGFACE_MODEL: &str = "HUGGINGFACE_MODEL";

impl Config {
    /// Apply overrides from an arbitrary lookup. Empty values are ignored;
    /// an unparseable `PORT` is logged and ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_PROVIDER) {
            self.backend.provider = v;
        }
        if let Some(v) = get(ENV_HOST) {
            self.server.host = v;
        }
        if let Some(v) = get(ENV_PORT) {
            match v.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid {ENV_PORT}"),
            }
        }
        if let Some(v) = get(ENV_OPENAI_BASE_URL) {
            self.backend.openai.base_url = v;
        }
        if let Some(v) = get(ENV_OPENAI_MODEL) {
            self.backend.openai.model = v;
        }
        if let Some(v) = get(ENV_OLLAMA_BASE_URL) {
            self.backend.ollama.base_url = v;
        }
        if let Some(v) = get(ENV_OLLAMA_MODEL) {
            self.backend.ollama.model = v;
        }
        if let Some(v) = get(ENV_HUGGINGFACE_MODEL) {
            self.backend.huggingface.model = v;
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration against the process environment.
    pub fn validate(&self) -> Vec<ConfigError> {
        self.validate_with(|key| std::env::var(key).ok())
    }

    /// Validate the configuration, reading credentials through `lookup`.
    ///
    /// Returns an empty vec when everything looks good. Missing credentials
    /// and unknown provider names are warnings only: the relay still starts
    /// and answers with fallback replies.
    pub fn validate_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let has_secret = |env: &str| lookup(env).is_some_and(|v| !v.trim().is_empty());

        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }

        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.max_concurrent_requests".into(),
                message: "max_concurrent_requests must be greater than 0".into(),
            });
        }

        if self.server.host.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }

        let base_urls = [
            ("backend.openai.base_url", &self.backend.openai.base_url),
            ("backend.ollama.base_url", &self.backend.ollama.base_url),
            ("backend.huggingface.base_url", &self.backend.huggingface.base_url),
        ];
        for (field, url) in base_urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: field.into(),
                    message: format!("'{url}' is not an http(s) URL"),
                });
            }
        }

        match self.backend.selection() {
            ProviderSelection::Hosted if !has_secret(&self.backend.openai.api_key_env) => {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: "backend.openai.api_key_env".into(),
                    message: format!(
                        "{} is not set; replies will use demo mode",
                        self.backend.openai.api_key_env
                    ),
                });
            }
            ProviderSelection::ThirdParty
                if !has_secret(&self.backend.huggingface.api_key_env) =>
            {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: "backend.huggingface.api_key_env".into(),
                    message: format!(
                        "{} is not set; replies will use demo mode",
                        self.backend.huggingface.api_key_env
                    ),
                });
            }
            ProviderSelection::Undetermined(name) => {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: "backend.provider".into(),
                    message: format!(
                        "unknown provider '{name}' (expected openai, ollama or huggingface); \
                         replies will use demo mode"
                    ),
                });
            }
            _ => {}
        }

        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "server.cors.allowed_origins".into(),
                message: "wildcard \"*\" allows all origins (not recommended for production)"
                    .into(),
            });
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "observability.sample_rate".into(),
                message: "sample_rate must be between 0.0 and 1.0".into(),
            });
        }

        errors
    }
}
