use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use cr_domain::config::CorsConfig;

/// Build a [`CorsLayer`] from the configured allowed origins.
///
/// Origins may end in `:*` to match any port on that host
/// (e.g. `http://localhost:*`). A lone `"*"` allows every origin.
pub fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\", all origins allowed");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE]);
    }

    let matcher = OriginMatcher::new(&cors.allowed_origins);
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            matcher.allows(origin)
        }))
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Exact origins plus `scheme://host:` prefixes for port wildcards.
#[derive(Debug, Clone, Default)]
struct OriginMatcher {
    exact: Vec<HeaderValue>,
    port_wildcards: Vec<String>,
}

impl OriginMatcher {
    fn new(origins: &[String]) -> Self {
        let mut matcher = Self::default();
        for origin in origins {
            if let Some(prefix) = origin.strip_suffix('*').filter(|p| p.ends_with(':')) {
                matcher.port_wildcards.push(prefix.to_owned());
            } else if let Ok(hv) = origin.parse::<HeaderValue>() {
                matcher.exact.push(hv);
            } else {
                tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
            }
        }
        matcher
    }

    fn allows(&self, origin: &HeaderValue) -> bool {
        if self.exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
            return true;
        }
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        self.port_wildcards.iter().any(|prefix| {
            origin
                .strip_prefix(prefix.as_str())
                .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
        })
    }
}
