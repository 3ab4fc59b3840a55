/// Shared infrastructure error type used across all chatrelay crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation failures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Why a backend could not produce a reply.
///
/// Returned by every backend adapter. These never escape the response
/// resolver: each one is turned into a fallback reply tagged with its
/// [`FallbackReason`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The provider reported quota or billing exhaustion.
    #[error("provider {provider}: rate limited ({message})")]
    RateLimited { provider: String, message: String },

    /// Transport error, timeout, non-success status or malformed reply.
    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    /// A credential the backend needs is absent; no call was attempted.
    #[error("provider {provider} not configured: {message}")]
    NotConfigured { provider: String, message: String },

    /// The configured provider name does not match any known backend.
    #[error("unrecognized provider '{0}'")]
    UnrecognizedProvider(String),
}

impl GenerationError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn not_configured(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotConfigured {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// The diagnostic class shown to the user alongside a fallback reply.
    pub fn fallback_reason(&self) -> FallbackReason {
        match self {
            Self::RateLimited { .. } => FallbackReason::Quota,
            Self::Provider { .. } => FallbackReason::ServiceError,
            Self::NotConfigured { .. } | Self::UnrecognizedProvider(_) => {
                FallbackReason::NotConfigured
            }
        }
    }
}

/// Diagnostic class attached to a fallback reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Quota,
    ServiceError,
    NotConfigured,
}

impl FallbackReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quota => "quota",
            Self::ServiceError => "service_error",
            Self::NotConfigured => "not_configured",
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
