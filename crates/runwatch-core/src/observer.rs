use std::time::Duration;

use runwatch_model::{FetchErrorKind, RunId, RunState, TrackEvent};

/// Classified result of one status query, as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Snapshot(RunState),
    /// Transient, the loop keeps polling.
    NotFound,
    Failed(FetchErrorKind),
    /// The loop was cancelled while the query was in flight.
    Discarded,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Snapshot(_) => "snapshot",
            FetchOutcome::NotFound => "not_found",
            FetchOutcome::Failed(_) => "failed",
            FetchOutcome::Discarded => "discarded",
        }
    }
}

/// Tracker-wide hook for logging and metrics.
///
/// Called synchronously from the poll tasks, so implementations must be cheap
/// and must not block.
pub trait TrackObserver: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_track(&self, _key: &str, _run_id: &RunId) {}

    fn on_fetch(&self, _key: &str, _outcome: &FetchOutcome) {}

    /// Every event delivered to the key's subscribers.
    fn on_event(&self, _key: &str, _event: &TrackEvent) {}

    /// The loop has been retired; `lifetime` spans creation to terminal event.
    fn on_finish(&self, _key: &str, _event: &TrackEvent, _lifetime: Duration) {}
}
