use std::time::Duration;

use runwatch_core::{FetchOutcome, TrackObserver};
use runwatch_model::{RunId, TrackEvent};
use tracing::{debug, info, trace};

use crate::subscriber::view::log_event;

/// Logs tracker activity through `tracing`.
#[derive(Debug, Default)]
pub struct Journal;

impl Journal {
    pub fn new() -> Self {
        Self
    }
}

impl TrackObserver for Journal {
    fn name(&self) -> &'static str {
        "journal"
    }

    fn on_track(&self, key: &str, run_id: &RunId) {
        info!(key, run_id = %run_id, "poll loop started");
    }

    fn on_fetch(&self, key: &str, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::NotFound => debug!(key, "run not visible yet"),
            other => trace!(key, outcome = other.as_str(), "status fetched"),
        }
    }

    fn on_event(&self, key: &str, event: &TrackEvent) {
        log_event(key, event);
    }

    fn on_finish(&self, key: &str, event: &TrackEvent, lifetime: Duration) {
        debug!(
            key,
            outcome = event.kind(),
            lifetime_ms = lifetime.as_millis() as u64,
            "poll loop retired"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runwatch_model::{FetchErrorKind, RunState};

    #[test]
    fn hooks_accept_every_outcome() {
        let journal = Journal::new();
        let run = RunId::from("run-1");

        journal.on_track("k", &run);
        for outcome in [
            FetchOutcome::NotFound,
            FetchOutcome::Snapshot(RunState::Running),
            FetchOutcome::Failed(FetchErrorKind::Server),
            FetchOutcome::Discarded,
        ] {
            journal.on_fetch("k", &outcome);
        }
        journal.on_finish("k", &TrackEvent::Cancelled, Duration::from_millis(5));
        assert_eq!(journal.name(), "journal");
    }
}
