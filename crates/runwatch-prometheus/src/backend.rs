use std::time::Duration;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    proto::MetricFamily,
};
use runwatch_core::{FetchOutcome, TrackObserver};
use runwatch_model::{RunId, TrackEvent};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to create or register metric: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Tracker metrics on a private [`Registry`].
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    tracks_started: IntCounter,
    active_loops: IntGauge,
    fetches: IntCounterVec,
    outcomes: IntCounterVec,
    run_duration: HistogramVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Register into an existing registry, e.g. one shared with the application.
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let tracks_started = IntCounter::with_opts(Opts::new(
            "runwatch_tracks_started_total",
            "Poll loops started (track and resume)",
        ))?;
        let active_loops = IntGauge::with_opts(Opts::new(
            "runwatch_active_loops",
            "Poll loops currently running",
        ))?;
        let fetches = IntCounterVec::new(
            Opts::new("runwatch_fetches_total", "Status queries by outcome"),
            &["outcome"],
        )?;
        let outcomes = IntCounterVec::new(
            Opts::new("runwatch_outcomes_total", "Terminal tracking outcomes"),
            &["outcome"],
        )?;
        let run_duration = HistogramVec::new(
            HistogramOpts::new(
                "runwatch_run_duration_seconds",
                "Time from track to terminal event",
            )
            .buckets(vec![1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
            &["outcome"],
        )?;

        registry.register(Box::new(tracks_started.clone()))?;
        registry.register(Box::new(active_loops.clone()))?;
        registry.register(Box::new(fetches.clone()))?;
        registry.register(Box::new(outcomes.clone()))?;
        registry.register(Box::new(run_duration.clone()))?;

        Ok(Self {
            registry,
            tracks_started,
            active_loops,
            fetches,
            outcomes,
            run_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

impl TrackObserver for PrometheusMetrics {
    fn name(&self) -> &'static str {
        "prometheus"
    }

    fn on_track(&self, _key: &str, _run_id: &RunId) {
        self.tracks_started.inc();
        self.active_loops.inc();
    }

    fn on_fetch(&self, _key: &str, outcome: &FetchOutcome) {
        self.fetches.with_label_values(&[outcome.as_str()]).inc();
    }

    fn on_finish(&self, _key: &str, event: &TrackEvent, lifetime: Duration) {
        let outcome = event.kind();
        self.active_loops.dec();
        self.outcomes.with_label_values(&[outcome]).inc();
        self.run_duration
            .with_label_values(&[outcome])
            .observe(lifetime.as_secs_f64());
    }
}
