//! AppState construction extracted from `main.rs`.
//!
//! Shared by `serve` and the integration tests so both boot the same way.

use std::sync::Arc;

use cr_domain::config::{Config, ConfigSeverity};
use cr_providers::ResponseResolver;

use crate::state::AppState;

/// Validate config, select the backend and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }

    // ── Backend ──────────────────────────────────────────────────────
    let resolver = Arc::new(ResponseResolver::from_config(&config.backend));
    tracing::info!(
        provider = %config.backend.provider,
        backend = %resolver.backend_name(),
        "response resolver ready"
    );

    Ok(AppState::new(config, resolver))
}
