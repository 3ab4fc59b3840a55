use cr_domain::conversation::GenerationRequest;
use cr_domain::error::GenerationError;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core backend trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trait that every text-generation backend must implement.
///
/// Implementations translate the canonical [`GenerationRequest`] into a
/// provider's wire format and the provider's reply back into plain text.
/// Every outbound call is bounded by a finite timeout; expiry is reported
/// as [`GenerationError::Provider`].
#[async_trait::async_trait]
pub trait TextBackend: Send + Sync {
    /// Produce a reply for `req`.
    async fn generate(&self, req: &GenerationRequest) -> Result<String, GenerationError>;

    /// Short identifier used in logs and trace events.
    fn name(&self) -> &str;
}
