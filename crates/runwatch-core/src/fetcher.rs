use async_trait::async_trait;
use runwatch_model::{FetchError, RunId, RunSnapshot};

/// Single status query against the workflow engine.
///
/// Implementations must not retry on their own: retry policy belongs to the
/// poll loop, which only retries [`FetchErrorKind::NotFound`](runwatch_model::FetchErrorKind::NotFound).
/// A request-level timeout is expected to be enforced by the implementation.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_status(&self, run_id: &RunId) -> Result<RunSnapshot, FetchError>;
}
