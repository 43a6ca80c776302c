mod run_id;
pub use run_id::RunId;

mod run_state;
pub use run_state::RunState;

mod run_snapshot;
pub use run_snapshot::RunSnapshot;

mod fetch_error;
pub use fetch_error::{FetchError, FetchErrorKind};

mod track_options;
pub use track_options::{DEFAULT_MAX_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS, TrackOptions};

mod track_event;
pub use track_event::TrackEvent;

/// Caller-chosen name of the logical thing being tracked.
///
/// Independent of the run that currently fulfils it: re-triggering a workflow
/// produces a new [`RunId`] under the same key.
pub type TrackingKey = String;
