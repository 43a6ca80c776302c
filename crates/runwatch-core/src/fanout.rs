use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use runwatch_model::{RunId, TrackEvent, TrackingKey};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::observer::{FetchOutcome, TrackObserver};

pub(crate) type Observers = Arc<Vec<Arc<dyn TrackObserver>>>;

/// Per-key dispatch of events to subscribers and observers.
///
/// Channels are unbounded so publishing never waits on a slow consumer and no
/// snapshot is dropped. Senders whose receiver is gone are pruned on publish.
#[derive(Clone)]
pub(crate) struct Fanout {
    key: TrackingKey,
    subscribers: Arc<Mutex<Vec<UnboundedSender<TrackEvent>>>>,
    observers: Observers,
}

impl Fanout {
    pub(crate) fn new(key: TrackingKey, observers: Observers) -> Self {
        Self {
            key,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            observers,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn subscribe(&self) -> UnboundedReceiver<TrackEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub(crate) fn publish(&self, event: TrackEvent) {
        for obs in self.observers.iter() {
            obs.on_event(&self.key, &event);
        }

        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn track_started(&self, run_id: &RunId) {
        for obs in self.observers.iter() {
            obs.on_track(&self.key, run_id);
        }
    }

    pub(crate) fn fetched(&self, outcome: FetchOutcome) {
        for obs in self.observers.iter() {
            obs.on_fetch(&self.key, &outcome);
        }
    }

    /// Deliver the terminal event and tell observers the loop is gone.
    pub(crate) fn finish(&self, event: TrackEvent, lifetime: Duration) {
        for obs in self.observers.iter() {
            obs.on_finish(&self.key, &event, lifetime);
        }
        self.publish(event);
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
