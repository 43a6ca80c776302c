use runwatch_model::{RunId, RunSnapshot, TrackEvent, TrackingKey};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::TrackError;

/// Receiving end of one key's event stream.
///
/// Yields zero or more [`TrackEvent::Snapshot`] items followed by exactly one
/// terminal event; after that [`Subscription::next`] returns `None`. Dropping
/// the subscription is fine, the tracker stops delivering to it.
pub struct Subscription {
    key: TrackingKey,
    run_id: RunId,
    rx: UnboundedReceiver<TrackEvent>,
    done: bool,
}

impl Subscription {
    pub(crate) fn new(key: TrackingKey, run_id: RunId, rx: UnboundedReceiver<TrackEvent>) -> Self {
        Self {
            key,
            run_id,
            rx,
            done: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// `true` once the terminal event has been handed out.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub async fn next(&mut self) -> Option<TrackEvent> {
        if self.done {
            return None;
        }
        let event = self.rx.recv().await;
        match &event {
            Some(ev) if !ev.is_terminal() => {}
            _ => self.done = true,
        }
        event
    }

    /// Skip intermediate snapshots and resolve to the final result.
    pub async fn wait(mut self) -> Result<RunSnapshot, TrackError> {
        while let Some(event) = self.next().await {
            match event {
                TrackEvent::Snapshot(_) => continue,
                TrackEvent::Completed(snapshot) => return Ok(snapshot),
                TrackEvent::TimedOut { elapsed } => return Err(TrackError::TimedOut { elapsed }),
                TrackEvent::Errored(err) => return Err(TrackError::Errored(err)),
                TrackEvent::Cancelled => return Err(TrackError::Cancelled),
            }
        }
        Err(TrackError::Closed)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("run_id", &self.run_id)
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runwatch_model::{FetchError, RunState};
    use tokio::sync::mpsc;

    fn sub() -> (mpsc::UnboundedSender<TrackEvent>, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Subscription::new("k".into(), RunId::from("run-1"), rx))
    }

    #[tokio::test]
    async fn wait_skips_snapshots() {
        let (tx, sub) = sub();
        let running = RunSnapshot::new(RunId::from("run-1"), RunState::Running);
        let done = RunSnapshot::new(RunId::from("run-1"), RunState::Failed);
        tx.send(TrackEvent::Snapshot(running)).unwrap();
        tx.send(TrackEvent::Completed(done.clone())).unwrap();

        assert_eq!(sub.wait().await.unwrap(), done);
    }

    #[tokio::test]
    async fn wait_maps_terminal_failures() {
        let (tx, sub) = sub();
        tx.send(TrackEvent::Errored(FetchError::server("500"))).unwrap();
        assert!(matches!(sub.wait().await, Err(TrackError::Errored(_))));

        let (tx, sub) = self::sub();
        tx.send(TrackEvent::Cancelled).unwrap();
        assert!(matches!(sub.wait().await, Err(TrackError::Cancelled)));
    }

    #[tokio::test]
    async fn closed_stream_without_terminal_is_reported() {
        let (tx, sub) = sub();
        drop(tx);
        assert!(matches!(sub.wait().await, Err(TrackError::Closed)));
    }

    #[tokio::test]
    async fn next_returns_none_after_terminal() {
        let (tx, mut sub) = sub();
        tx.send(TrackEvent::Cancelled).unwrap();
        tx.send(TrackEvent::Cancelled).unwrap();

        assert_eq!(sub.next().await, Some(TrackEvent::Cancelled));
        assert!(sub.is_done());
        assert_eq!(sub.next().await, None);
    }
}
