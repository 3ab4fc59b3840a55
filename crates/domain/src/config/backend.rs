use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Provider selection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which generation backend the relay talks to. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSelection {
    /// Hosted chat-completions API (OpenAI).
    Hosted,
    /// Local inference server (Ollama).
    Local,
    /// Third-party inference API (Hugging Face).
    ThirdParty,
    /// The configured name matched no backend; holds the raw name.
    Undetermined(String),
}

impl ProviderSelection {
    /// Map a configured provider name onto a backend.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Unknown names map to [`ProviderSelection::Undetermined`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" | "hosted" => Self::Hosted,
            "ollama" | "local" => Self::Local,
            "huggingface" | "hugging_face" | "hf" | "third-party" | "third_party" => {
                Self::ThirdParty
            }
            _ => Self::Undetermined(name.trim().to_string()),
        }
    }

    /// Short backend name reported by the health endpoint.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Hosted => "openai",
            Self::Local => "ollama",
            Self::ThirdParty => "huggingface",
            Self::Undetermined(_) => "none",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Backend config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Provider name: `openai`, `ollama` or `huggingface`.
    #[serde(default = "d_provider")]
    pub provider: String,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub huggingface: HuggingFaceConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: d_provider(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
            huggingface: HuggingFaceConfig::default(),
        }
    }
}

impl BackendConfig {
    pub fn selection(&self) -> ProviderSelection {
        ProviderSelection::from_name(&self.provider)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "d_openai_base_url")]
    pub base_url: String,
    #[serde(default = "d_openai_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "d_openai_key_env")]
    pub api_key_env: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: d_openai_base_url(),
            model: d_openai_model(),
            api_key_env: d_openai_key_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "d_ollama_base_url")]
    pub base_url: String,
    #[serde(default = "d_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: d_ollama_base_url(),
            model: d_ollama_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    #[serde(default = "d_hf_base_url")]
    pub base_url: String,
    #[serde(default = "d_hf_model")]
    pub model: String,
    /// Environment variable holding the inference API token.
    #[serde(default = "d_hf_key_env")]
    pub api_key_env: String,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            base_url: d_hf_base_url(),
            model: d_hf_model(),
            api_key_env: d_hf_key_env(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_provider() -> String {
    "openai".into()
}
fn d_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_openai_model() -> String {
    "gpt-3.5-turbo".into()
}
fn d_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn d_ollama_base_url() -> String {
    "http://localhost:11434".into()
}
fn d_ollama_model() -> String {
    "llama2".into()
}
fn d_hf_base_url() -> String {
    "https://api-inference.huggingface.co/models".into()
}
fn d_hf_model() -> String {
    "microsoft/DialoGPT-medium".into()
}
fn d_hf_key_env() -> String {
    "HUGGINGFACE_API_KEY".into()
}
