use std::time::Duration;

use crate::{FetchError, RunSnapshot};

/// One item of a subscription stream.
///
/// A stream carries zero or more [`TrackEvent::Snapshot`] items followed by
/// exactly one terminal item.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackEvent {
    /// Non-terminal status observed by a poll.
    Snapshot(RunSnapshot),
    /// The run reached a terminal state.
    Completed(RunSnapshot),
    /// The deadline passed before a terminal state was observed.
    TimedOut { elapsed: Duration },
    /// A non-transient fetch failure stopped the loop.
    Errored(FetchError),
    /// Tracking was cancelled by the owner or replaced by a newer run.
    Cancelled,
}

impl TrackEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TrackEvent::Snapshot(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TrackEvent::Snapshot(_) => "snapshot",
            TrackEvent::Completed(_) => "completed",
            TrackEvent::TimedOut { .. } => "timed_out",
            TrackEvent::Errored(_) => "errored",
            TrackEvent::Cancelled => "cancelled",
        }
    }

    pub fn snapshot(&self) -> Option<&RunSnapshot> {
        match self {
            TrackEvent::Snapshot(s) | TrackEvent::Completed(s) => Some(s),
            _ => None,
        }
    }
}
