use runwatch_model::{RunState, TrackEvent};
use tracing::{debug, error, info, warn};

#[inline]
pub fn message_for(event: &TrackEvent) -> &'static str {
    match event {
        TrackEvent::Snapshot(_) => "run is still active",
        TrackEvent::Completed(_) => "run reached a terminal state",
        TrackEvent::TimedOut { .. } => "run did not finish before the tracking deadline",
        TrackEvent::Errored(_) => "run status could not be fetched (fatal)",
        TrackEvent::Cancelled => "tracking cancelled",
    }
}

#[inline]
pub fn log_event(key: &str, event: &TrackEvent) {
    let msg = message_for(event);

    match event {
        TrackEvent::Snapshot(s) => {
            debug!(key, run_id = %s.run_id, state = %s.state, "{msg}")
        }
        TrackEvent::Completed(s) => {
            if s.state == RunState::Succeeded {
                info!(key, run_id = %s.run_id, state = %s.state, "{msg}")
            } else {
                warn!(key, run_id = %s.run_id, state = %s.state, "{msg}")
            }
        }
        TrackEvent::TimedOut { elapsed } => {
            warn!(key, elapsed_ms = elapsed.as_millis() as u64, "{msg}")
        }
        TrackEvent::Errored(err) => {
            error!(key, kind = %err.kind, reason = %err.message, "{msg}")
        }
        TrackEvent::Cancelled => info!(key, "{msg}"),
    }
}
