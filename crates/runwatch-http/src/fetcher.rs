use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use runwatch_core::StatusFetcher;
use runwatch_model::{FetchError, FetchErrorKind, RunId, RunSnapshot, RunState};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{config::HttpFetcherConfig, errors::HttpFetcherError};

/// Fetches `GET {base_url}/{runs_path}/{run_id}` and decodes the JSON body.
///
/// The body must carry the run status in a `status` (or `state`) string
/// field; the whole document becomes the snapshot payload. One request per
/// call, no retries.
#[derive(Clone)]
pub struct HttpStatusFetcher {
    client: reqwest::Client,
    base: Url,
    runs_path: Vec<String>,
    bearer_token: Option<String>,
}

impl HttpStatusFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self, HttpFetcherError> {
        config.validate()?;

        let base = Url::parse(config.base_url.trim())
            .map_err(|e| HttpFetcherError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(HttpFetcherError::InvalidUrl(config.base_url));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base,
            runs_path: config
                .runs_path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            bearer_token: config.bearer_token,
        })
    }

    fn status_url(&self, run_id: &RunId) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FetchError::malformed(format!("cannot append to {}", self.base)))?;
            segments.pop_if_empty();
            segments.extend(&self.runs_path);
            segments.push(run_id.as_str());
        }
        Ok(url)
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusFetcher {
    async fn fetch_status(&self, run_id: &RunId) -> Result<RunSnapshot, FetchError> {
        let url = self.status_url(run_id)?;
        trace!(%url, "requesting run status");

        let mut request = self.client.get(url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if let Some(kind) = classify_status(status) {
            debug!(run_id = %run_id, %status, "run status request rejected");
            return Err(FetchError::new(kind, format!("engine answered {status}")));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        decode_snapshot(run_id, &body)
    }
}

/// `None` for success codes.
fn classify_status(status: StatusCode) -> Option<FetchErrorKind> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND {
        Some(FetchErrorKind::NotFound)
    } else {
        Some(FetchErrorKind::Server)
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_decode() {
        FetchError::malformed(err.to_string())
    } else {
        FetchError::network(err.to_string())
    }
}

fn decode_snapshot(run_id: &RunId, body: &[u8]) -> Result<RunSnapshot, FetchError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| FetchError::malformed(format!("invalid json body: {e}")))?;

    let raw = payload
        .get("status")
        .or_else(|| payload.get("state"))
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::malformed("response has no status field"))?;
    let Ok(state) = raw.parse::<RunState>();

    Ok(RunSnapshot::new(run_id.clone(), state).with_payload(payload))
}
