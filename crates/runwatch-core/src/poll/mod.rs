//! Per-key polling state machine.
//!
//! ```text
//! Initial -> Waiting -> Querying -> Waiting ...
//!                          |-> Completed   (terminal run state)
//!                          |-> Errored     (fetch error other than NotFound)
//!            |-> TimedOut  (deadline checked before every query and before every wait)
//! Cancelled preempts Waiting and Querying.
//! ```

use std::{sync::Arc, time::Duration};

use runwatch_model::{FetchError, RunId, RunSnapshot, TrackEvent, TrackOptions};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::{fanout::Fanout, fetcher::StatusFetcher, observer::FetchOutcome};

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopOutcome {
    Completed(RunSnapshot),
    TimedOut { elapsed: Duration },
    Errored(FetchError),
    Cancelled,
}

impl LoopOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopOutcome::Completed(_) => "completed",
            LoopOutcome::TimedOut { .. } => "timed_out",
            LoopOutcome::Errored(_) => "errored",
            LoopOutcome::Cancelled => "cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoopOutcome::Cancelled)
    }

    pub fn into_event(self) -> TrackEvent {
        match self {
            LoopOutcome::Completed(snapshot) => TrackEvent::Completed(snapshot),
            LoopOutcome::TimedOut { elapsed } => TrackEvent::TimedOut { elapsed },
            LoopOutcome::Errored(err) => TrackEvent::Errored(err),
            LoopOutcome::Cancelled => TrackEvent::Cancelled,
        }
    }
}

/// Drives one run until it reaches a terminal outcome.
///
/// The loop is the only writer of its own state. Non-terminal snapshots are
/// published before the next wait starts; the terminal outcome is returned to
/// the owner, which retires the loop and publishes it.
pub(crate) struct PollLoop {
    run_id: RunId,
    options: TrackOptions,
    fetcher: Arc<dyn StatusFetcher>,
    token: CancellationToken,
    fanout: Fanout,
    started: Instant,
}

impl PollLoop {
    pub(crate) fn new(
        run_id: RunId,
        options: TrackOptions,
        fetcher: Arc<dyn StatusFetcher>,
        token: CancellationToken,
        fanout: Fanout,
    ) -> Self {
        Self {
            run_id,
            options,
            fetcher,
            token,
            fanout,
            started: Instant::now(),
        }
    }

    pub(crate) fn started(&self) -> Instant {
        self.started
    }

    pub(crate) async fn run(self) -> LoopOutcome {
        let key = self.fanout.key();
        let mut attempt: u32 = 0;

        loop {
            // Waiting. The first query is delayed too: a run that was just
            // submitted is almost never visible yet.
            tokio::select! {
                biased;
                _ = self.token.cancelled() => return LoopOutcome::Cancelled,
                _ = time::sleep(self.options.poll_interval) => {}
            }

            if let Some(elapsed) = self.deadline_passed() {
                warn!(key, run_id = %self.run_id, ?elapsed, attempt, "run did not finish before deadline");
                return LoopOutcome::TimedOut { elapsed };
            }

            // Querying
            attempt += 1;
            trace!(key, run_id = %self.run_id, attempt, "querying run status");
            let result = tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    self.fanout.fetched(FetchOutcome::Discarded);
                    return LoopOutcome::Cancelled;
                }
                res = self.fetcher.fetch_status(&self.run_id) => res,
            };
            if self.token.is_cancelled() {
                self.fanout.fetched(FetchOutcome::Discarded);
                return LoopOutcome::Cancelled;
            }

            match result {
                Ok(snapshot) if snapshot.is_terminal() => {
                    self.fanout.fetched(FetchOutcome::Snapshot(snapshot.state));
                    debug!(key, run_id = %self.run_id, state = %snapshot.state, attempt, "run reached terminal state");
                    return LoopOutcome::Completed(snapshot);
                }
                Ok(snapshot) => {
                    self.fanout.fetched(FetchOutcome::Snapshot(snapshot.state));
                    debug!(key, run_id = %self.run_id, state = %snapshot.state, attempt, "run still active");
                    self.fanout.publish(TrackEvent::Snapshot(snapshot));
                }
                Err(err) if err.is_transient() => {
                    self.fanout.fetched(FetchOutcome::NotFound);
                    debug!(key, run_id = %self.run_id, attempt, "run not visible yet, will retry");
                }
                Err(err) => {
                    self.fanout.fetched(FetchOutcome::Failed(err.kind));
                    error!(key, run_id = %self.run_id, attempt, error = %err, "status fetch failed");
                    return LoopOutcome::Errored(err);
                }
            }

            if let Some(elapsed) = self.deadline_passed() {
                warn!(key, run_id = %self.run_id, ?elapsed, attempt, "run did not finish before deadline");
                return LoopOutcome::TimedOut { elapsed };
            }
        }
    }

    fn deadline_passed(&self) -> Option<Duration> {
        let elapsed = self.started.elapsed();
        (elapsed >= self.options.max_timeout).then_some(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use runwatch_model::{FetchErrorKind, RunState};

    use super::*;

    /// Replays a script of results; the last entry repeats forever.
    struct Scripted {
        script: Mutex<VecDeque<Result<RunState, FetchErrorKind>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Vec<Result<RunState, FetchErrorKind>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusFetcher for Scripted {
        async fn fetch_status(&self, run_id: &RunId) -> Result<RunSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                *script.front().unwrap()
            };
            match next {
                Ok(state) => Ok(RunSnapshot::new(run_id.clone(), state)),
                Err(kind) => Err(FetchError::new(kind, "scripted")),
            }
        }
    }

    fn opts(interval_secs: u64, timeout_secs: u64) -> TrackOptions {
        TrackOptions::default()
            .with_poll_interval_secs(interval_secs)
            .with_max_timeout_secs(timeout_secs)
    }

    fn make_loop(
        fetcher: Arc<Scripted>,
        options: TrackOptions,
    ) -> (PollLoop, CancellationToken, Fanout) {
        let token = CancellationToken::new();
        let fanout = Fanout::new("wf".into(), Arc::new(Vec::new()));
        let poll = PollLoop::new(
            RunId::from("run-1"),
            options,
            fetcher,
            token.clone(),
            fanout.clone(),
        );
        (poll, token, fanout)
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_retried_until_terminal() {
        let fetcher = Scripted::new(vec![
            Err(FetchErrorKind::NotFound),
            Err(FetchErrorKind::NotFound),
            Ok(RunState::Running),
            Ok(RunState::Succeeded),
        ]);
        let (poll, _token, fanout) = make_loop(fetcher.clone(), opts(1, 120));
        let mut rx = fanout.subscribe();

        let start = Instant::now();
        let outcome = poll.run().await;
        let elapsed = start.elapsed();

        match outcome {
            LoopOutcome::Completed(s) => assert_eq!(s.state, RunState::Succeeded),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fetcher.calls(), 4);
        assert!(elapsed >= Duration::from_secs(3) && elapsed <= Duration::from_secs(4));

        // only the Running snapshot is published; the terminal one is the owner's job
        match rx.try_recv() {
            Ok(TrackEvent::Snapshot(s)) => assert_eq!(s.state, RunState::Running),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_stops_without_retry() {
        let fetcher = Scripted::new(vec![Err(FetchErrorKind::Network)]);
        let (poll, _token, _fanout) = make_loop(fetcher.clone(), opts(1, 120));

        let outcome = poll.run().await;

        assert!(matches!(
            outcome,
            LoopOutcome::Errored(ref e) if e.kind == FetchErrorKind::Network
        ));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn never_terminal_times_out() {
        let fetcher = Scripted::new(vec![Ok(RunState::Running)]);
        let (poll, _token, _fanout) = make_loop(fetcher.clone(), opts(2, 10));

        let outcome = poll.run().await;

        match outcome {
            LoopOutcome::TimedOut { elapsed } => assert!(elapsed >= Duration::from_secs(10)),
            other => panic!("unexpected outcome: {other:?}"),
        }
        // queries at 2, 4, 6, 8; deadline hit at 10 before a fifth query
        assert_eq!(fetcher.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_state_is_returned_as_terminal() {
        let fetcher = Scripted::new(vec![Ok(RunState::Unknown)]);
        let (poll, _token, _fanout) = make_loop(fetcher.clone(), opts(1, 120));

        let outcome = poll.run().await;

        assert!(matches!(
            outcome,
            LoopOutcome::Completed(ref s) if s.state == RunState::Unknown
        ));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_wait_skips_fetch() {
        let fetcher = Scripted::new(vec![Ok(RunState::Running)]);
        let (poll, token, _fanout) = make_loop(fetcher.clone(), opts(5, 120));

        let handle = tokio::spawn(poll.run());
        time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), LoopOutcome::Cancelled);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_token_exits_immediately() {
        let fetcher = Scripted::new(vec![Ok(RunState::Running)]);
        let (poll, token, _fanout) = make_loop(fetcher.clone(), opts(1, 120));
        token.cancel();

        assert_eq!(poll.run().await, LoopOutcome::Cancelled);
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn outcome_maps_to_terminal_event() {
        assert_eq!(LoopOutcome::Cancelled.into_event(), TrackEvent::Cancelled);
        let ev = LoopOutcome::TimedOut {
            elapsed: Duration::from_secs(3),
        }
        .into_event();
        assert!(ev.is_terminal());
        assert_eq!(ev.kind(), "timed_out");
    }
}
