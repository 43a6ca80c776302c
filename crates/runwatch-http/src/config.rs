use serde::{Deserialize, Serialize};

use crate::errors::HttpFetcherError;

pub const DEFAULT_RUNS_PATH: &str = "runs";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpFetcherConfig {
    /// Engine API root, e.g. `https://engine.example.com/api/v1`.
    pub base_url: String,
    /// Path segment(s) under `base_url` that hold runs; the run id is appended.
    pub runs_path: String,
    /// Sent as `Authorization: Bearer <token>` when set.
    #[serde(skip_serializing)]
    pub bearer_token: Option<String>,
    /// Per-request timeout. Keep it well below the tracking deadline.
    pub request_timeout_ms: u64,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            runs_path: DEFAULT_RUNS_PATH.to_string(),
            bearer_token: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl HttpFetcherConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    pub fn validate(&self) -> Result<(), HttpFetcherError> {
        if self.base_url.trim().is_empty() {
            return Err(HttpFetcherError::InvalidConfig("base url is empty".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(HttpFetcherError::InvalidConfig(
                "request timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(HttpFetcherConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let cfg = HttpFetcherConfig::new("  ");
        assert!(matches!(cfg.validate(), Err(HttpFetcherError::InvalidConfig(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = HttpFetcherConfig::default().with_request_timeout_ms(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn token_is_never_serialized() {
        let cfg = HttpFetcherConfig::default().with_bearer_token("secret");
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("secret"));
    }
}
