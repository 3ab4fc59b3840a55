//! Backend registry.
//!
//! Maps the configured provider name onto exactly one adapter, once, at
//! startup. Credentials are resolved eagerly (env vars are read here).

use std::sync::Arc;

use cr_domain::config::{BackendConfig, ProviderSelection};

use crate::huggingface::HuggingFaceBackend;
use crate::ollama::OllamaBackend;
use crate::openai::OpenAiBackend;
use crate::traits::TextBackend;

/// Instantiate the adapter for `config.selection()`.
///
/// Returns `None` for an unrecognised provider name, and also when the
/// adapter fails to initialise; the failure is logged and the relay keeps
/// running in demo mode.
pub fn build_backend(config: &BackendConfig) -> Option<Arc<dyn TextBackend>> {
    let selection = config.selection();
    let result = match &selection {
        ProviderSelection::Hosted => {
            OpenAiBackend::from_config(&config.openai).map(|b| Arc::new(b) as Arc<dyn TextBackend>)
        }
        ProviderSelection::Local => {
            OllamaBackend::from_config(&config.ollama).map(|b| Arc::new(b) as Arc<dyn TextBackend>)
        }
        ProviderSelection::ThirdParty => HuggingFaceBackend::from_config(&config.huggingface)
            .map(|b| Arc::new(b) as Arc<dyn TextBackend>),
        ProviderSelection::Undetermined(name) => {
            tracing::warn!(
                provider = %name,
                "unrecognized AI provider, every reply will be a fallback"
            );
            return None;
        }
    };

    match result {
        Ok(backend) => {
            tracing::info!(
                backend = %backend.name(),
                selection = ?selection,
                "registered text backend"
            );
            Some(backend)
        }
        Err(e) => {
            tracing::warn!(
                selection = ?selection,
                error = %e,
                "failed to initialize text backend, serving fallbacks"
            );
            None
        }
    }
}
