//! Response resolution: one dispatch-and-fallback path for every caller.
//!
//! The resolver is total. Whatever the backend does, the caller gets
//! displayable text back, tagged with whether it was generated or served
//! from the fallback pool.

use std::sync::Arc;
use std::time::Instant;

use cr_domain::config::{BackendConfig, ProviderSelection};
use cr_domain::conversation::{GenerationRequest, Turn, CONTEXT_WINDOW};
use cr_domain::error::{FallbackReason, GenerationError};
use cr_domain::trace::TraceEvent;

use crate::fallback::fallback_reply;
use crate::registry::build_backend;
use crate::traits::TextBackend;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reply
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Generated,
    Fallback(FallbackReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ReplySource::Fallback(_))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Resolver
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ResponseResolver {
    selection: ProviderSelection,
    /// `None` when the selection is undetermined or the adapter failed to
    /// initialise.
    backend: Option<Arc<dyn TextBackend>>,
}

impl ResponseResolver {
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.selection(), build_backend(config))
    }

    pub fn new(selection: ProviderSelection, backend: Option<Arc<dyn TextBackend>>) -> Self {
        Self { selection, backend }
    }

    pub fn selection(&self) -> &ProviderSelection {
        &self.selection
    }

    /// Short name reported by the health endpoint.
    pub fn backend_name(&self) -> &'static str {
        self.selection.backend_name()
    }

    /// Stateless form: the message alone, no history.
    pub async fn resolve(&self, message: &str) -> Reply {
        self.dispatch(GenerationRequest::new(message, Vec::new())).await
    }

    /// Streaming form: the message grounded in prior turns. Only the last
    /// [`CONTEXT_WINDOW`] turns of `history` are sent.
    pub async fn resolve_with_history(&self, message: &str, history: &[Turn]) -> Reply {
        let start = history.len().saturating_sub(CONTEXT_WINDOW);
        self.dispatch(GenerationRequest::new(message, history[start..].to_vec()))
            .await
    }

    async fn dispatch(&self, req: GenerationRequest) -> Reply {
        match self.generate(&req).await {
            Ok(text) => Reply {
                text,
                source: ReplySource::Generated,
            },
            Err(e) => {
                let reason = e.fallback_reason();
                tracing::warn!(
                    backend = %self.backend_name(),
                    reason = %reason,
                    error = %e,
                    "backend failed, serving fallback reply"
                );
                TraceEvent::FallbackServed {
                    backend: self.backend_name().to_string(),
                    reason: reason.to_string(),
                    error: e.to_string(),
                }
                .emit();
                Reply {
                    text: fallback_reply(reason),
                    source: ReplySource::Fallback(reason),
                }
            }
        }
    }

    async fn generate(&self, req: &GenerationRequest) -> Result<String, GenerationError> {
        let backend = match (&self.selection, &self.backend) {
            (ProviderSelection::Undetermined(name), _) => {
                return Err(GenerationError::UnrecognizedProvider(name.clone()));
            }
            (_, None) => {
                return Err(GenerationError::not_configured(
                    self.backend_name(),
                    "backend is not available",
                ));
            }
            (_, Some(backend)) => backend,
        };

        let started = Instant::now();
        let result = backend.generate(req).await.and_then(|text| {
            if text.trim().is_empty() {
                Err(GenerationError::provider(backend.name(), "empty completion"))
            } else {
                Ok(text)
            }
        });

        TraceEvent::BackendRequest {
            backend: backend.name().to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            ok: result.is_ok(),
        }
        .emit();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait::async_trait]
    impl TextBackend for Echo {
        async fn generate(&self, req: &GenerationRequest) -> Result<String, GenerationError> {
            Ok(format!("echo: {}", req.user_message))
        }
        fn name(&self) -> &str {
            "echo"
        }
    }

    struct Blank;

    #[async_trait::async_trait]
    impl TextBackend for Blank {
        async fn generate(&self, _req: &GenerationRequest) -> Result<String, GenerationError> {
            Ok("   ".into())
        }
        fn name(&self) -> &str {
            "blank"
        }
    }

    #[tokio::test]
    async fn generated_text_is_returned_verbatim() {
        let r = ResponseResolver::new(ProviderSelection::Local, Some(Arc::new(Echo)));
        let reply = r.resolve("ping").await;
        assert_eq!(reply.text, "echo: ping");
        assert_eq!(reply.source, ReplySource::Generated);
        assert!(!reply.is_fallback());
    }

    #[tokio::test]
    async fn blank_completion_is_a_service_error() {
        let r = ResponseResolver::new(ProviderSelection::Hosted, Some(Arc::new(Blank)));
        let reply = r.resolve("ping").await;
        assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::ServiceError));
        assert!(!reply.text.trim().is_empty());
    }

    #[tokio::test]
    async fn undetermined_selection_ignores_any_backend() {
        let r = ResponseResolver::new(
            ProviderSelection::Undetermined("gemini".into()),
            Some(Arc::new(Echo)),
        );
        let reply = r.resolve("ping").await;
        assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::NotConfigured));
        assert_eq!(r.backend_name(), "none");
    }

    #[tokio::test]
    async fn missing_backend_is_not_configured() {
        let r = ResponseResolver::new(ProviderSelection::ThirdParty, None);
        let reply = r.resolve("ping").await;
        assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::NotConfigured));
        assert_eq!(r.backend_name(), "huggingface");
    }
}
