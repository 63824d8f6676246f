//! Dispatch configuration shared by the binary and the dispatcher

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Header carrying the originating group name to every backend
pub const GROUP_HEADER: &str = "x-group";

/// Relative path probed on every endpoint of a group
pub const DEFAULT_HEALTH_PATH: &str = "/health";

/// Per-call deadline used when none is configured
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Maximum length for an endpoint address
const MAX_URL_LENGTH: usize = 2048;

/// Fan-out and health probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-endpoint deadline in milliseconds; 0 falls back to the default
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Relative path appended to each endpoint for health probes
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Skip TLS certificate verification for endpoints
    #[serde(default)]
    pub skip_tls_verify: bool,
}

impl DispatchConfig {
    /// The per-endpoint deadline, never zero
    pub fn timeout(&self) -> Duration {
        if self.timeout_ms == 0 {
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        } else {
            Duration::from_millis(self.timeout_ms)
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            health_path: default_health_path(),
            skip_tls_verify: false,
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_health_path() -> String {
    DEFAULT_HEALTH_PATH.to_string()
}

/// Check that an endpoint base address is an absolute HTTP(S) URL
pub fn validate_endpoint_url(endpoint: &str) -> Result<(), String> {
    if endpoint.len() > MAX_URL_LENGTH {
        return Err(format!(
            "URL exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        ));
    }

    let url = Url::parse(endpoint).map_err(|e| format!("Invalid URL format: {}", e))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(format!("Unsupported URL scheme '{}'", scheme)),
    }

    if url.host_str().is_none() {
        return Err("URL has no host".to_string());
    }

    Ok(())
}
