//! Prometheus metrics for the runwatch tracker.
//!
//! [`PrometheusMetrics`] is a [`runwatch_core::TrackObserver`]; register it on
//! the tracker builder and expose [`PrometheusMetrics::gather`] from your own
//! HTTP server.
//!
//! ## Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use runwatch_core::Tracker;
//! use runwatch_prometheus::PrometheusMetrics;
//!
//! let metrics = Arc::new(PrometheusMetrics::new()?);
//! let tracker = Tracker::builder(fetcher)
//!     .with_observer(metrics.clone())
//!     .build()?;
//!
//! let encoder = prometheus::TextEncoder::new();
//! let body = encoder.encode_to_string(&metrics.gather())?;
//! ```
//!
//! ## Metrics
//! - `runwatch_tracks_started_total` - Counter
//! - `runwatch_active_loops` - Gauge
//! - `runwatch_fetches_total{outcome}` - Counter
//! - `runwatch_outcomes_total{outcome}` - Counter
//! - `runwatch_run_duration_seconds{outcome}` - Histogram
//!
//! ## HTTP Server
//! This crate does NOT provide an HTTP server for the `/metrics` endpoint.

mod backend;
pub use backend::{MetricsError, PrometheusMetrics};

pub use prometheus::{Encoder, Registry, TextEncoder};
