use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use runwatch_model::{FetchError, RunId, RunSnapshot, TrackOptions, TrackingKey};
use tokio::{sync::Mutex, task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::{CoreError, RegistryError, TrackError},
    fanout::{Fanout, Observers},
    fetcher::StatusFetcher,
    observer::TrackObserver,
    poll::{LoopOutcome, PollLoop},
    registry::{MemoryRegistry, RunRegistry},
};

mod config;
pub use config::{DEFAULT_NAMESPACE, NAMESPACE_SEPARATOR, TrackerConfig};

mod subscription;
pub use subscription::Subscription;

/// Multiplexes poll loops by tracking key.
///
/// Holds at most one loop per key; tracking a key again cancels the previous
/// loop first (last caller wins). Cloning is cheap and clones share state.
/// Call [`Tracker::cancel_all`] on shutdown: loops are not stopped on drop.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<Inner>,
}

struct Inner {
    config: TrackerConfig,
    fetcher: Arc<dyn StatusFetcher>,
    registry: Arc<dyn RunRegistry>,
    observers: Observers,
    /// The single synchronisation point: every map change and the registry
    /// write that goes with it happen under this lock.
    loops: Mutex<HashMap<TrackingKey, ActiveLoop>>,
    generation: AtomicU64,
}

struct ActiveLoop {
    run_id: RunId,
    generation: u64,
    token: CancellationToken,
    fanout: Fanout,
    handle: JoinHandle<()>,
}

impl ActiveLoop {
    fn subscribe(&self) -> Subscription {
        Subscription::new(
            self.fanout.key().to_string(),
            self.run_id.clone(),
            self.fanout.subscribe(),
        )
    }
}

pub struct TrackerBuilder {
    config: TrackerConfig,
    fetcher: Arc<dyn StatusFetcher>,
    registry: Option<Arc<dyn RunRegistry>>,
    observers: Vec<Arc<dyn TrackObserver>>,
}

impl TrackerBuilder {
    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to a [`MemoryRegistry`], which does not survive restarts.
    pub fn with_registry(mut self, registry: Arc<dyn RunRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TrackObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_observers(mut self, observers: Vec<Arc<dyn TrackObserver>>) -> Self {
        self.observers.extend(observers);
        self
    }

    pub fn build(self) -> Result<Tracker, CoreError> {
        self.config.validate()?;
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(MemoryRegistry::new()));

        debug!(
            namespace = %self.config.namespace,
            observers = self.observers.len(),
            "tracker built"
        );
        Ok(Tracker {
            inner: Arc::new(Inner {
                config: self.config,
                fetcher: self.fetcher,
                registry,
                observers: Arc::new(self.observers),
                loops: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        })
    }
}

impl Tracker {
    pub fn builder(fetcher: Arc<dyn StatusFetcher>) -> TrackerBuilder {
        TrackerBuilder {
            config: TrackerConfig::default(),
            fetcher,
            registry: None,
            observers: Vec::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    /// Start polling `run_id` under `key` and subscribe to it.
    ///
    /// The registry entry is written before the loop starts. An existing loop
    /// for the key is cancelled and its subscribers receive `Cancelled` before
    /// this returns.
    #[instrument(level = "debug", skip(self, run_id, options))]
    pub async fn track(
        &self,
        key: &str,
        run_id: impl Into<RunId>,
        options: TrackOptions,
    ) -> Result<Subscription, CoreError> {
        options.validate()?;
        let run_id = run_id.into();

        let (subscription, replaced) = {
            let mut loops = self.inner.loops.lock().await;
            self.inner
                .registry
                .put(&self.inner.registry_key(key), &run_id)
                .await?;

            let replaced = loops.remove(key).map(|old| {
                old.token.cancel();
                info!(key, old_run_id = %old.run_id, new_run_id = %run_id, "replacing tracked run");
                old.handle
            });

            let (active, subscription) = self.spawn_loop(key, run_id.clone(), options);
            loops.insert(key.to_string(), active);
            (subscription, replaced)
        };

        if let Some(handle) = replaced {
            join_retired(key, handle).await;
        }
        info!(key, run_id = %run_id, interval = ?options.poll_interval, timeout = ?options.max_timeout, "tracking run");
        Ok(subscription)
    }

    /// [`Tracker::track`] with the tracker's default options.
    pub async fn track_default(
        &self,
        key: &str,
        run_id: impl Into<RunId>,
    ) -> Result<Subscription, CoreError> {
        self.track(key, run_id, self.inner.config.defaults).await
    }

    /// Track and wait for the final snapshot.
    pub async fn track_and_wait(
        &self,
        key: &str,
        run_id: impl Into<RunId>,
        options: TrackOptions,
    ) -> Result<RunSnapshot, TrackError> {
        self.track(key, run_id, options).await?.wait().await
    }

    /// Attach another subscriber to the loop running for `key`.
    ///
    /// Events published before this call are not replayed.
    pub async fn subscribe(&self, key: &str) -> Option<Subscription> {
        let loops = self.inner.loops.lock().await;
        loops.get(key).map(ActiveLoop::subscribe)
    }

    /// Whether the registry still holds an entry for `key`.
    ///
    /// Reflects persisted state, not in-process loops: after a restart this is
    /// `true` for runs that [`Tracker::resume`] would pick up.
    pub async fn is_tracking(&self, key: &str) -> Result<bool, CoreError> {
        let run_id = self
            .inner
            .registry
            .get(&self.inner.registry_key(key))
            .await?;
        Ok(run_id.is_some())
    }

    /// Run id currently recorded for `key`.
    pub async fn tracked_run(&self, key: &str) -> Result<Option<RunId>, CoreError> {
        Ok(self
            .inner
            .registry
            .get(&self.inner.registry_key(key))
            .await?)
    }

    /// Keys recorded in the registry under this tracker's namespace.
    pub async fn list_tracked_keys(&self) -> Result<BTreeSet<TrackingKey>, CoreError> {
        let ns = &self.inner.config.namespace;
        let keys = self.inner.registry.list_keys(ns).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(ns.as_str()).map(str::to_string))
            .collect())
    }

    /// Keys with a loop running in this process.
    pub async fn active_keys(&self) -> Vec<TrackingKey> {
        let loops = self.inner.loops.lock().await;
        let mut keys: Vec<_> = loops.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Stop tracking `key`. Idempotent.
    ///
    /// Returns once the loop has stopped and its subscribers got `Cancelled`.
    #[instrument(level = "debug", skip(self))]
    pub async fn cancel(&self, key: &str) -> Result<(), CoreError> {
        let (removed, result) = {
            let mut loops = self.inner.loops.lock().await;
            let removed = loops.remove(key);
            if let Some(active) = &removed {
                active.token.cancel();
            }
            let result = self
                .inner
                .registry
                .delete(&self.inner.registry_key(key))
                .await;
            (removed, result)
        };

        if let Some(active) = removed {
            join_retired(key, active.handle).await;
            info!(key, run_id = %active.run_id, "tracking cancelled");
        }
        Ok(result?)
    }

    /// Cancel every loop and clear every registry entry in the namespace.
    #[instrument(level = "debug", skip(self))]
    pub async fn cancel_all(&self) -> Result<(), CoreError> {
        let (drained, result) = {
            let mut loops = self.inner.loops.lock().await;
            let drained: Vec<ActiveLoop> = loops.drain().map(|(_, active)| active).collect();
            for active in &drained {
                active.token.cancel();
            }
            (drained, self.inner.clear_namespace().await)
        };

        let count = drained.len();
        for active in drained {
            join_retired(active.fanout.key(), active.handle).await;
        }
        info!(cancelled = count, "all tracking cancelled");
        Ok(result?)
    }

    /// Restart polling for every registry entry without a running loop.
    ///
    /// Intended right after start-up, with a persistent registry.
    #[instrument(level = "debug", skip(self))]
    pub async fn resume(&self) -> Result<Vec<Subscription>, CoreError> {
        let ns = self.inner.config.namespace.clone();
        let keys = self.inner.registry.list_keys(&ns).await?;
        let mut resumed = Vec::new();

        for full in keys {
            let Some(key) = full.strip_prefix(ns.as_str()) else {
                continue;
            };
            let mut loops = self.inner.loops.lock().await;
            if loops.contains_key(key) {
                continue;
            }
            let Some(run_id) = self.inner.registry.get(&full).await? else {
                continue;
            };

            let (active, subscription) =
                self.spawn_loop(key, run_id.clone(), self.inner.config.defaults);
            resumed.push(subscription);
            loops.insert(key.to_string(), active);
            info!(key, run_id = %run_id, "resumed tracking");
        }
        Ok(resumed)
    }

    /// Must be called with the loop map locked.
    ///
    /// The returned subscription is attached before the task is spawned, so
    /// it cannot miss the first snapshot however short the interval is.
    fn spawn_loop(
        &self,
        key: &str,
        run_id: RunId,
        options: TrackOptions,
    ) -> (ActiveLoop, Subscription) {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();
        let fanout = Fanout::new(key.to_string(), Arc::clone(&self.inner.observers));
        let subscription = Subscription::new(key.to_string(), run_id.clone(), fanout.subscribe());
        fanout.track_started(&run_id);

        let poll = PollLoop::new(
            run_id.clone(),
            options,
            Arc::clone(&self.inner.fetcher),
            token.clone(),
            fanout.clone(),
        );
        let started = poll.started();
        let inner = Arc::clone(&self.inner);
        let task_fanout = fanout.clone();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            // The loop runs in its own task so a panic in a fetcher or observer
            // still reaches `retire` instead of leaking the key.
            let outcome = match tokio::spawn(poll.run()).await {
                Ok(outcome) => outcome,
                Err(e) if task_token.is_cancelled() => {
                    warn!(key = task_fanout.key(), error = %e, "poll task failed after cancellation");
                    LoopOutcome::Cancelled
                }
                Err(e) => {
                    error!(key = task_fanout.key(), error = %e, "poll task failed");
                    LoopOutcome::Errored(FetchError::internal(format!("poll task failed: {e}")))
                }
            };
            inner.retire(generation, started, &task_fanout, outcome).await;
        });

        let active = ActiveLoop {
            run_id,
            generation,
            token,
            fanout,
            handle,
        };
        (active, subscription)
    }
}

/// Await a loop that was already removed from the map.
async fn join_retired(key: &str, handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        warn!(key, error = %e, "poll loop task did not exit cleanly");
    }
}

impl Inner {
    fn registry_key(&self, key: &str) -> String {
        format!("{}{}", self.config.namespace, key)
    }

    /// Bookkeeping after a loop stopped, then the terminal event.
    ///
    /// A cancelled loop was already removed by whoever cancelled it. Otherwise
    /// the map and registry entries are dropped only if they still belong to
    /// this generation, so a replaced loop never touches its successor.
    async fn retire(&self, generation: u64, started: Instant, fanout: &Fanout, outcome: LoopOutcome) {
        let key = fanout.key();

        if !outcome.is_cancelled() {
            let mut loops = self.loops.lock().await;
            if loops.get(key).is_some_and(|a| a.generation == generation) {
                loops.remove(key);
                if let Err(e) = self.registry.delete(&self.registry_key(key)).await {
                    warn!(key, error = %e, "failed to remove registry entry of finished run");
                }
            }
        }

        info!(key, outcome = outcome.as_str(), "tracking finished");
        fanout.finish(outcome.into_event(), started.elapsed());
    }

    async fn clear_namespace(&self) -> Result<(), RegistryError> {
        let keys = self.registry.list_keys(&self.config.namespace).await?;
        for key in keys {
            self.registry.delete(&key).await?;
        }
        Ok(())
    }
}
