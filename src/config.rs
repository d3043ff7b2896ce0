// Gateway configuration
//
// Built once at startup and shared read-only with every tool.

use std::time::Duration;

use crate::gateway::constants::{DEFAULT_BASE_URL, TEST_USERNAME};
use crate::gateway::redact::DEFAULT_REDACT_KEYS;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials and client settings for the Fat Zebra API
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub username: String,
    pub token: String,
    /// Shared secret for verifying webhook signatures
    pub webhook_secret: Option<String>,
    /// Applied to every outbound request; requests are never retried
    pub request_timeout: Duration,
    /// Key names blanked in logged bodies
    pub redact_keys: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: TEST_USERNAME.to_string(),
            token: TEST_USERNAME.to_string(),
            webhook_secret: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            redact_keys: DEFAULT_REDACT_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl GatewayConfig {
    /// Sandbox configuration pointed at another base URL
    pub fn sandbox(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn is_test_mode(&self) -> bool {
        self.username == TEST_USERNAME
    }

    /// Label reported by the health endpoint
    pub fn environment(&self) -> &'static str {
        if self.is_test_mode() {
            "sandbox"
        } else {
            "live"
        }
    }
}

/// Split a comma separated list, dropping blanks
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_sandbox() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, "https://gateway.pmnts-sandbox.io/v1.0");
        assert!(config.is_test_mode());
        assert_eq!(config.environment(), "sandbox");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.redact_keys.iter().any(|k| k == "authorization"));
    }

    #[test]
    fn test_parse_key_list() {
        assert_eq!(parse_key_list(" token, ,bsb,"), vec!["token".to_string(), "bsb".to_string()]);
    }
}
