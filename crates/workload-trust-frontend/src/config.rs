//! Frontend configuration

use std::path::PathBuf;
use std::time::Duration;

use workload_trust_core::env::{duration_or, parse_or, string_or, Lookup};
use workload_trust_core::TelemetryConfig;

pub const DEFAULT_SPIFFE_ID: &str = "spiffe://example.org/ns/demo/sa/frontend";
pub const DEFAULT_BACKEND_SPIFFE_ID: &str = "spiffe://example.org/ns/demo/sa/backend";

/// Local Envoy listener that forwards to the backend over mTLS
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8001";

/// Frontend service configuration
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub port: u16,
    /// Base URL of the backend, normally the sidecar proxy
    pub backend_url: String,
    /// This workload's SPIFFE ID
    pub spiffe_id: String,
    /// SPIFFE ID the proxy verifies the backend against
    pub backend_spiffe_id: String,
    /// Directory holding `index.html` and the UI assets
    pub static_path: PathBuf,
    pub backend_timeout: Duration,
    /// Upper bound on handling one HTTP request; longer than
    /// `backend_timeout` so a slow backend surfaces as a 502
    pub request_timeout: Duration,
    pub telemetry: TelemetryConfig,
}

impl FrontendConfig {
    pub fn from_lookup(env: &impl Lookup) -> Self {
        Self {
            port: parse_or(env, "PORT", 8080),
            backend_url: string_or(env, "BACKEND_URL", DEFAULT_BACKEND_URL)
                .trim_end_matches('/')
                .to_string(),
            spiffe_id: string_or(env, "SPIFFE_ID", DEFAULT_SPIFFE_ID),
            backend_spiffe_id: string_or(env, "BACKEND_SPIFFE_ID", DEFAULT_BACKEND_SPIFFE_ID),
            static_path: PathBuf::from(string_or(env, "STATIC_PATH", "/app/static")),
            backend_timeout: duration_or(env, "BACKEND_TIMEOUT", Duration::from_secs(10)),
            request_timeout: duration_or(env, "REQUEST_TIMEOUT", Duration::from_secs(15)),
            telemetry: TelemetryConfig::from_lookup(env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = FrontendConfig::from_lookup(&HashMap::<&str, &str>::new());

        assert_eq!(config.port, 8080);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.spiffe_id, DEFAULT_SPIFFE_ID);
        assert_eq!(config.backend_spiffe_id, DEFAULT_BACKEND_SPIFFE_ID);
        assert_eq!(config.static_path, PathBuf::from("/app/static"));
        assert_eq!(config.backend_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_backend_url_trailing_slash_trimmed() {
        let env: HashMap<&str, &str> = [
            ("BACKEND_URL", "http://backend.demo.svc:9090/"),
            ("BACKEND_TIMEOUT", "1500ms"),
        ]
        .into_iter()
        .collect();
        let config = FrontendConfig::from_lookup(&env);

        assert_eq!(config.backend_url, "http://backend.demo.svc:9090");
        assert_eq!(config.backend_timeout, Duration::from_millis(1500));
    }
}
